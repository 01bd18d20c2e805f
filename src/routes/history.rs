// ABOUTME: Recently viewed recipe route handlers for the authenticated user
// ABOUTME: Lists, records and clears view history
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{paginate, PaginationQuery};
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::info;

/// History routes implementation
pub struct HistoryRoutes;

impl HistoryRoutes {
    /// Create all history routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/history/", get(Self::handle_list))
            .route("/api/history/clear/", delete(Self::handle_clear))
            .route("/api/history/:recipe_id/", post(Self::handle_record))
            .with_state(resources)
    }

    /// Handle GET /api/history/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        uri: Uri,
        Query(pagination): Query<PaginationQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let params = resources.page_params(pagination.page, pagination.page_size);
        let (results, count) = resources.database.list_history(auth.user_id, params).await?;
        let page = paginate(&uri, params, results, count)?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/history/:recipe_id/
    async fn handle_record(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        resources
            .database
            .get_visible_recipe(recipe_id, Some(auth.user_id))
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;

        let (entry, created) = resources.database.touch_history(auth.user_id, recipe_id).await?;
        let status = if created { StatusCode::CREATED } else { StatusCode::OK };
        Ok((status, Json(entry)).into_response())
    }

    /// Handle DELETE /api/history/clear/
    async fn handle_clear(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let removed = resources.database.clear_history(auth.user_id).await?;
        info!(user_id = auth.user_id, removed, "History cleared");
        Ok((StatusCode::OK, Json(json!({ "message": "History cleared" }))).into_response())
    }
}
