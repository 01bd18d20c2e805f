// ABOUTME: HTTP client the main API uses to query the vector search server
// ABOUTME: Failures are logged and degrade to empty results instead of erroring
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use crate::config::VectorClientConfig;
use crate::constants::vector::CLIENT_TIMEOUT_SECS;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::vector::{InsertRequest, RecipeInput, SearchHit, SearchRequest};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, warn};

/// Client for the vector server's `/search` and `/insert`
#[derive(Clone)]
pub struct RecipeSearchClient {
    client: Client,
    base_url: String,
    access_token: Option<String>,
}

impl RecipeSearchClient {
    /// Build a client with the standard timeout
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created
    pub fn new(config: &VectorClientConfig) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(CLIENT_TIMEOUT_SECS))
            .build()
            .map_err(|e| AppError::internal(format!("Failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_owned(),
            access_token: config.access_token.clone(),
        })
    }

    /// Search the vector server; any failure yields an empty list
    pub async fn search(&self, query: &str, limit: usize, include_ingredients: Option<Vec<String>>) -> Vec<SearchHit> {
        let request = SearchRequest {
            query: query.to_owned(),
            include_ingredients,
            limit,
        };
        match self.try_search(&request).await {
            Ok(hits) => {
                debug!(hits = hits.len(), "Vector search succeeded");
                hits
            }
            Err(e) => {
                warn!("Vector search failed, returning no results: {e}");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
        let response = self
            .authorized(self.client.post(format!("{}/search", self.base_url)))
            .json(request)
            .send()
            .await
            .map_err(|e| AppError::external_service("Vector search", e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::external_service("Vector search", e.to_string()))?;

        response
            .json::<Vec<SearchHit>>()
            .await
            .map_err(|e| AppError::external_service("Vector search", format!("Invalid response: {e}")))
    }

    /// Post a batch of records to `/insert`
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or a non-success status
    pub async fn insert(&self, recipes: Vec<RecipeInput>) -> AppResult<String> {
        let response = self
            .authorized(self.client.post(format!("{}/insert", self.base_url)))
            .json(&InsertRequest { recipes })
            .send()
            .await
            .map_err(|e| AppError::external_service("Vector insert", e.to_string()))?;

        let status = response.status();
        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| AppError::external_service("Vector insert", format!("Invalid response: {e}")))?;
        if !status.is_success() {
            return Err(AppError::external_service(
                "Vector insert",
                format!("HTTP {status}: {body}"),
            ));
        }
        Ok(body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned())
    }

    fn authorized(&self, request: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match &self.access_token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// Public recipe ids for hits whose `foodname` equals a recipe title, in hit order
///
/// # Errors
///
/// Returns an error if the database query fails
pub async fn map_hits_to_recipe_ids(database: &Database, hits: &[SearchHit]) -> AppResult<Vec<i64>> {
    let titles: Vec<String> = hits.iter().map(|hit| hit.foodname.clone()).collect();
    let by_title = database.public_recipe_ids_by_title(&titles).await?;

    let mut ids = Vec::with_capacity(hits.len());
    for hit in hits {
        if let Some(id) = by_title.get(&hit.foodname) {
            if !ids.contains(id) {
                ids.push(*id);
            }
        }
    }
    Ok(ids)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unreachable_server_yields_empty_results() {
        let client = RecipeSearchClient::new(&VectorClientConfig {
            url: "http://127.0.0.1:9/".to_owned(),
            access_token: Some("token".to_owned()),
        })
        .unwrap();
        assert_eq!(client.base_url, "http://127.0.0.1:9");
        assert!(client.search("kabab", 3, None).await.is_empty());
    }
}
