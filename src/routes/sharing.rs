// ABOUTME: Public share link route handler
// ABOUTME: Resolves a share id to the full recipe and counts the view
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use chrono::Utc;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

/// Share link routes implementation
pub struct SharingRoutes;

impl SharingRoutes {
    /// Create all share routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/share/:share_id/", get(Self::handle_shared_recipe))
            .with_state(resources)
    }

    /// Handle GET /api/share/:share_id/
    ///
    /// The link grants read access to the recipe even when it is private.
    async fn handle_shared_recipe(
        State(resources): State<Arc<ServerResources>>,
        Path(raw_share_id): Path<String>,
    ) -> Result<Response, AppError> {
        let share_id = Uuid::parse_str(&raw_share_id).map_err(|_| AppError::not_found("Share"))?;
        let share = resources
            .database
            .get_share(share_id)
            .await?
            .filter(|share| !share.is_expired(Utc::now()))
            .ok_or_else(|| AppError::not_found("Share"))?;

        let recipe = resources
            .database
            .recipe_detail(share.recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;
        let view_count = resources.database.increment_share_views(share_id).await?;

        let body = json!({
            "id": share.id,
            "share_id": share.share_id,
            "recipe": recipe,
            "created_by": share.created_by,
            "view_count": view_count,
            "created_at": share.created_at,
            "expires_at": share.expires_at,
        });
        Ok((StatusCode::OK, Json(body)).into_response())
    }
}
