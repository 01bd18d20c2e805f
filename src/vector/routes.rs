// ABOUTME: HTTP surface of the vector search server: /insert, /search, /health
// ABOUTME: Insert and search require the configured bearer token
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{InsertRequest, SearchHit, SearchRequest, VectorDocument, VectorStore};
use crate::constants::vector::{BLANK_QUERY_LIMIT, CANDIDATE_MULTIPLIER};
use crate::errors::{AppError, AppResult};
use crate::llm::EmbeddingProvider;
use crate::routes::JsonBody;
use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderMap},
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// Shared state of the vector server
#[derive(Clone)]
pub struct VectorState {
    /// Document store
    pub store: VectorStore,
    /// Embedding endpoint
    pub embedder: Arc<dyn EmbeddingProvider>,
    /// Bearer token callers must present
    pub access_token: Arc<str>,
}

/// Vector server routes
pub struct VectorRoutes;

impl VectorRoutes {
    /// `/insert` and `/search` behind bearer auth, plus an open `/health`
    pub fn routes(state: VectorState) -> Router {
        let protected = Router::new()
            .route("/insert", post(insert_recipes))
            .route("/search", post(search_recipes))
            .layer(middleware::from_fn_with_state(state.clone(), require_token));

        Router::new()
            .route("/health", get(health))
            .merge(protected)
            .with_state(state)
    }
}

async fn require_token(
    State(state): State<VectorState>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token = headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(AppError::auth_required)?;

    if token != &*state.access_token {
        warn!("Rejected vector request with invalid token");
        return Err(AppError::auth_invalid("Invalid token"));
    }
    Ok(next.run(request).await)
}

async fn health(State(state): State<VectorState>) -> AppResult<Json<Value>> {
    Ok(Json(json!({
        "status": "healthy",
        "documents": state.store.count().await?,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    })))
}

async fn insert_recipes(
    State(state): State<VectorState>,
    JsonBody(request): JsonBody<InsertRequest>,
) -> AppResult<Json<Value>> {
    if request.recipes.is_empty() {
        return Err(AppError::invalid_input("No recipes provided"));
    }

    let texts: Vec<String> = request.recipes.iter().map(VectorDocument::page_content).collect();
    let embeddings = state.embedder.embed(&texts).await?;
    let documents: Vec<VectorDocument> = request
        .recipes
        .into_iter()
        .zip(embeddings)
        .map(|(recipe, embedding)| VectorDocument::from_input(recipe, embedding))
        .collect();

    let inserted = state.store.insert(&documents).await?;
    info!(inserted, "Inserted recipe documents");
    Ok(Json(json!({
        "message": format!("Successfully inserted {inserted} recipes.")
    })))
}

async fn search_recipes(
    State(state): State<VectorState>,
    JsonBody(request): JsonBody<SearchRequest>,
) -> AppResult<Json<Vec<SearchHit>>> {
    Ok(Json(search(&state, &request).await?))
}

/// Rank, filter by required ingredients, and truncate to the request limit
///
/// # Errors
///
/// Returns an error if embedding the query or reading the store fails
pub async fn search(state: &VectorState, request: &SearchRequest) -> AppResult<Vec<SearchHit>> {
    let candidates: Vec<(VectorDocument, f32)> = if request.query.trim().is_empty() {
        state
            .store
            .list(BLANK_QUERY_LIMIT)
            .await?
            .into_iter()
            .map(|doc| (doc, 0.0))
            .collect()
    } else {
        let query = state.embedder.embed_one(&request.query).await?;
        state
            .store
            .nearest(&query, request.limit.saturating_mul(CANDIDATE_MULTIPLIER))
            .await?
    };

    let required = request.include_ingredients.as_deref().unwrap_or_default();
    Ok(candidates
        .iter()
        .filter(|(doc, _)| doc.has_all_ingredients(required))
        .take(request.limit)
        .map(|(doc, score)| doc.to_hit(*score))
        .collect())
}
