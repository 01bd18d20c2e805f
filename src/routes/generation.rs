// ABOUTME: Route handlers for a user's AI recipe generation requests
// ABOUTME: Lists generations and exposes their status and finished recipe
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{paginate, PaginationQuery};
use crate::errors::AppError;
use crate::models::{GenerationStatus, RecipeGeneration};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;

/// Generation routes implementation
pub struct GenerationRoutes;

impl GenerationRoutes {
    /// Create all generation routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/generation/", get(Self::handle_list))
            .route("/api/generation/:id/", get(Self::handle_detail))
            .route("/api/generation/:id/status/", get(Self::handle_status))
            .route("/api/generation/:id/result/", get(Self::handle_result))
            .with_state(resources)
    }

    async fn own_generation(
        resources: &ServerResources,
        headers: &HeaderMap,
        generation_id: i64,
    ) -> Result<RecipeGeneration, AppError> {
        let auth = resources.auth_middleware.authenticate_request(headers).await?;
        resources
            .database
            .get_generation(auth.user_id, generation_id)
            .await?
            .ok_or_else(|| AppError::not_found("Generation"))
    }

    /// Handle GET /api/generation/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        uri: Uri,
        Query(pagination): Query<PaginationQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let params = resources.page_params(pagination.page, pagination.page_size);
        let (results, count) = resources.database.list_generations(auth.user_id, params).await?;
        let page = paginate(&uri, params, results, count)?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle GET /api/generation/:id/
    async fn handle_detail(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(generation_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let generation = Self::own_generation(&resources, &headers, generation_id).await?;
        Ok((StatusCode::OK, Json(generation)).into_response())
    }

    /// Handle GET /api/generation/:id/status/
    async fn handle_status(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(generation_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let generation = Self::own_generation(&resources, &headers, generation_id).await?;
        let body = json!({
            "id": generation.id,
            "status": generation.status,
            "created_at": generation.created_at,
            "updated_at": generation.updated_at,
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/generation/:id/result/
    async fn handle_result(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(generation_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let generation = Self::own_generation(&resources, &headers, generation_id).await?;

        match generation.status {
            GenerationStatus::Completed => {
                let detail = match generation.recipe_id {
                    Some(recipe_id) => resources.database.recipe_detail(recipe_id).await?,
                    None => None,
                };
                let detail = detail.ok_or_else(|| AppError::not_found("Generated recipe"))?;
                Ok((StatusCode::OK, Json(detail)).into_response())
            }
            GenerationStatus::Failed => Ok((
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "status": generation.status,
                    "error": generation
                        .error_message
                        .unwrap_or_else(|| "Generation failed".to_owned()),
                })),
            )
                .into_response()),
            GenerationStatus::Pending | GenerationStatus::Processing => Ok((
                StatusCode::ACCEPTED,
                Json(json!({
                    "status": generation.status,
                    "message": "Generation is still in progress",
                })),
            )
                .into_response()),
        }
    }
}
