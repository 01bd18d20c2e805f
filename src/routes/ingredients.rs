// ABOUTME: Ingredient route handlers: paginated catalog, name search and substitutes
// ABOUTME: Admins can add ingredients and register substitutes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{paginate, query_pairs, query_value, JsonBody, PaginationQuery};
use crate::errors::AppError;
use crate::middleware::require_admin;
use crate::models::{NewIngredient, NewSubstitute};
use crate::resources::ServerResources;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// `POST /api/ingredients/substitute/` body
#[derive(Debug, Clone, Deserialize)]
pub struct SubstituteLookupRequest {
    /// Ingredients to look up
    #[serde(default)]
    pub ingredient_ids: Vec<i64>,
}

/// Ingredient routes implementation
pub struct IngredientRoutes;

impl IngredientRoutes {
    /// Create all ingredient routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/ingredients/",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/ingredients/search/", get(Self::handle_search))
            .route("/api/ingredients/substitute/", post(Self::handle_substitute_lookup))
            .route("/api/ingredients/:id/", get(Self::handle_detail))
            .route(
                "/api/ingredients/:id/substitutes/",
                get(Self::handle_substitutes).post(Self::handle_add_substitute),
            )
            .with_state(resources)
    }

    /// Handle GET /api/ingredients/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        uri: Uri,
        Query(pagination): Query<PaginationQuery>,
    ) -> Result<Response, AppError> {
        let pairs = query_pairs(&uri);
        let params = resources.page_params(pagination.page, pagination.page_size);
        let (results, count) = resources
            .database
            .list_ingredients(
                query_value(&pairs, "search"),
                query_value(&pairs, "ordering"),
                params,
            )
            .await?;
        let page = paginate(&uri, params, results, count)?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/ingredients/ (admin)
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<NewIngredient>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        if request.name.trim().is_empty() {
            return Err(AppError::missing_field("name"));
        }
        if resources.database.get_ingredient_by_name(request.name.trim()).await?.is_some() {
            return Err(AppError::invalid_input(
                "ingredient with this name already exists.",
            ));
        }

        let ingredient = resources.database.create_ingredient(&request).await?;
        Ok((StatusCode::CREATED, Json(ingredient)).into_response())
    }

    /// Handle GET /api/ingredients/search/?q=
    async fn handle_search(
        State(resources): State<Arc<ServerResources>>,
        uri: Uri,
    ) -> Result<Response, AppError> {
        let pairs = query_pairs(&uri);
        let query = query_value(&pairs, "q")
            .ok_or_else(|| AppError::invalid_input("Query parameter 'q' is required"))?;
        let ingredients = resources.database.search_ingredients(query).await?;
        Ok((StatusCode::OK, Json(ingredients)).into_response())
    }

    /// Handle GET /api/ingredients/:id/
    async fn handle_detail(
        State(resources): State<Arc<ServerResources>>,
        Path(ingredient_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let ingredient = resources
            .database
            .get_ingredient(ingredient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Ingredient"))?;
        Ok((StatusCode::OK, Json(ingredient)).into_response())
    }

    /// Handle GET /api/ingredients/:id/substitutes/
    async fn handle_substitutes(
        State(resources): State<Arc<ServerResources>>,
        Path(ingredient_id): Path<i64>,
    ) -> Result<Response, AppError> {
        if resources.database.get_ingredient(ingredient_id).await?.is_none() {
            return Err(AppError::not_found("Ingredient"));
        }
        let substitutes = resources.database.get_substitutes(ingredient_id).await?;
        Ok((StatusCode::OK, Json(substitutes)).into_response())
    }

    /// Handle POST /api/ingredients/:id/substitutes/ (admin)
    async fn handle_add_substitute(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(ingredient_id): Path<i64>,
        JsonBody(request): JsonBody<NewSubstitute>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        let substitute = resources
            .database
            .add_substitute(ingredient_id, &request)
            .await?;
        Ok((StatusCode::CREATED, Json(substitute)).into_response())
    }

    /// Handle POST /api/ingredients/substitute/
    async fn handle_substitute_lookup(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<SubstituteLookupRequest>,
    ) -> Result<Response, AppError> {
        if request.ingredient_ids.is_empty() {
            return Err(AppError::invalid_input("ingredient_ids is required"));
        }

        let mut results = Vec::with_capacity(request.ingredient_ids.len());
        for ingredient_id in request.ingredient_ids {
            let Some(ingredient) = resources.database.get_ingredient(ingredient_id).await? else {
                continue;
            };
            let substitutes = resources.database.get_substitutes(ingredient_id).await?;
            results.push(json!({
                "ingredient": ingredient,
                "substitutes": substitutes,
            }));
        }
        Ok((StatusCode::OK, Json(results)).into_response())
    }
}
