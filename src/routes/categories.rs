// ABOUTME: Catalog route handlers for categories, tags and dietary types
// ABOUTME: Public listing and retrieval; admins create new entries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::JsonBody;
use crate::errors::{AppError, AppResult};
use crate::middleware::require_admin;
use crate::models::NewCatalogEntry;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use std::sync::Arc;

fn checked_name(entry: &NewCatalogEntry) -> AppResult<&str> {
    let name = entry.name.trim();
    if name.is_empty() {
        return Err(AppError::missing_field("name"));
    }
    Ok(name)
}

/// Category, tag and dietary type routes implementation
pub struct CategoryRoutes;

impl CategoryRoutes {
    /// Create all catalog routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/categories/",
                get(Self::handle_list_categories).post(Self::handle_create_category),
            )
            .route("/api/categories/:id/", get(Self::handle_get_category))
            .route(
                "/api/tags/",
                get(Self::handle_list_tags).post(Self::handle_create_tag),
            )
            .route("/api/tags/:id/", get(Self::handle_get_tag))
            .route(
                "/api/dietary-types/",
                get(Self::handle_list_dietary_types).post(Self::handle_create_dietary_type),
            )
            .route("/api/dietary-types/:id/", get(Self::handle_get_dietary_type))
            .with_state(resources)
    }

    async fn handle_list_categories(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let categories = resources.database.list_categories().await?;
        Ok((StatusCode::OK, Json(categories)).into_response())
    }

    async fn handle_get_category(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<i64>,
    ) -> Result<Response, AppError> {
        let category = resources
            .database
            .get_category(id)
            .await?
            .ok_or_else(|| AppError::not_found("Category"))?;
        Ok((StatusCode::OK, Json(category)).into_response())
    }

    async fn handle_create_category(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(entry): JsonBody<NewCatalogEntry>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        checked_name(&entry)?;
        let category = resources.database.create_category(&entry).await?;
        Ok((StatusCode::CREATED, Json(category)).into_response())
    }

    async fn handle_list_tags(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let tags = resources.database.list_tags().await?;
        Ok((StatusCode::OK, Json(tags)).into_response())
    }

    async fn handle_get_tag(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<i64>,
    ) -> Result<Response, AppError> {
        let tag = resources
            .database
            .get_tag(id)
            .await?
            .ok_or_else(|| AppError::not_found("Tag"))?;
        Ok((StatusCode::OK, Json(tag)).into_response())
    }

    async fn handle_create_tag(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(entry): JsonBody<NewCatalogEntry>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        let tag = resources.database.create_tag(checked_name(&entry)?).await?;
        Ok((StatusCode::CREATED, Json(tag)).into_response())
    }

    async fn handle_list_dietary_types(
        State(resources): State<Arc<ServerResources>>,
    ) -> Result<Response, AppError> {
        let dietary_types = resources.database.list_dietary_types().await?;
        Ok((StatusCode::OK, Json(dietary_types)).into_response())
    }

    async fn handle_get_dietary_type(
        State(resources): State<Arc<ServerResources>>,
        Path(id): Path<i64>,
    ) -> Result<Response, AppError> {
        let dietary_type = resources
            .database
            .get_dietary_type(id)
            .await?
            .ok_or_else(|| AppError::not_found("Dietary type"))?;
        Ok((StatusCode::OK, Json(dietary_type)).into_response())
    }

    async fn handle_create_dietary_type(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(entry): JsonBody<NewCatalogEntry>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        checked_name(&entry)?;
        let dietary_type = resources.database.create_dietary_type(&entry).await?;
        Ok((StatusCode::CREATED, Json(dietary_type)).into_response())
    }
}
