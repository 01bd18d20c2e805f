// ABOUTME: Bookmark route handlers scoped to the authenticated user
// ABOUTME: Create, list, fetch, delete and check bookmarks on visible recipes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{paginate, JsonBody, PaginationQuery};
use crate::errors::AppError;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// `POST /api/bookmarks/` body
#[derive(Debug, Clone, Deserialize)]
pub struct CreateBookmarkRequest {
    /// Recipe to bookmark
    pub recipe_id: Option<i64>,
}

/// Bookmark routes implementation
pub struct BookmarkRoutes;

impl BookmarkRoutes {
    /// Create all bookmark routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/bookmarks/",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/bookmarks/check/:recipe_id/", get(Self::handle_check))
            .route(
                "/api/bookmarks/:id/",
                get(Self::handle_detail).delete(Self::handle_delete),
            )
            .with_state(resources)
    }

    /// Handle GET /api/bookmarks/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        uri: Uri,
        Query(pagination): Query<PaginationQuery>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let params = resources.page_params(pagination.page, pagination.page_size);
        let (results, count) = resources.database.list_bookmarks(auth.user_id, params).await?;
        let page = paginate(&uri, params, results, count)?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/bookmarks/
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<CreateBookmarkRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let recipe_id = request
            .recipe_id
            .ok_or_else(|| AppError::missing_field("recipe_id"))?;
        resources
            .database
            .get_visible_recipe(recipe_id, Some(auth.user_id))
            .await?
            .ok_or_else(|| AppError::not_found("Recipe"))?;

        let bookmark = resources.database.create_bookmark(auth.user_id, recipe_id).await?;
        Ok((StatusCode::CREATED, Json(bookmark)).into_response())
    }

    /// Handle GET /api/bookmarks/:id/
    async fn handle_detail(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bookmark_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let bookmark = resources
            .database
            .get_bookmark(auth.user_id, bookmark_id)
            .await?
            .ok_or_else(|| AppError::not_found("Bookmark"))?;
        Ok((StatusCode::OK, Json(bookmark)).into_response())
    }

    /// Handle DELETE /api/bookmarks/:id/
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(bookmark_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        if !resources.database.delete_bookmark(auth.user_id, bookmark_id).await? {
            return Err(AppError::not_found("Bookmark"));
        }
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle GET /api/bookmarks/check/:recipe_id/
    async fn handle_check(
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

        let is_bookmarked = resources.database.is_bookmarked(auth.user_id, recipe_id).await?;
        Ok((StatusCode::OK, Json(json!({ "is_bookmarked": is_bookmarked }))).into_response())
    }
}
