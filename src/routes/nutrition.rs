// ABOUTME: Nutrition route handlers: totals for recipes or ad-hoc ingredient lists
// ABOUTME: Per-100g ingredient values are public; admins maintain stored values
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::JsonBody;
use crate::errors::AppError;
use crate::middleware::require_admin;
use crate::models::NutritionFacts;
use crate::resources::ServerResources;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

fn default_quantity() -> String {
    "100g".to_owned()
}

/// One ad-hoc ingredient line
#[derive(Debug, Clone, Deserialize)]
pub struct IngredientQuantity {
    /// Ingredient id
    pub ingredient_id: i64,
    /// Free-text amount; grams scale the per-100g values
    #[serde(default = "default_quantity")]
    pub quantity: String,
}

/// `POST /api/nutrition/calculate/` body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CalculateRequest {
    /// Total an existing recipe
    pub recipe_id: Option<i64>,
    /// Or total these lines
    pub ingredients: Option<Vec<IngredientQuantity>>,
}

/// Nutrition routes implementation
pub struct NutritionRoutes;

impl NutritionRoutes {
    /// Create all nutrition routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/nutrition/calculate/", post(Self::handle_calculate))
            .route(
                "/api/nutrition/ingredients/:id/",
                get(Self::handle_ingredient).put(Self::handle_update_ingredient),
            )
            .route("/api/nutrition/recipes/:id/", put(Self::handle_update_recipe))
            .with_state(resources)
    }

    /// Handle POST /api/nutrition/calculate/
    async fn handle_calculate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<CalculateRequest>,
    ) -> Result<Response, AppError> {
        let totals = if let Some(recipe_id) = request.recipe_id {
            let viewer = resources.auth_middleware.authenticate_optional(&headers).await?;
            resources
                .database
                .get_visible_recipe(recipe_id, viewer.map(|auth| auth.user_id))
                .await?
                .ok_or_else(|| AppError::not_found("Recipe"))?;
            resources.database.recipe_nutrition_facts(recipe_id).await?
        } else if let Some(lines) = request.ingredients.filter(|lines| !lines.is_empty()) {
            let lines: Vec<(i64, String)> = lines
                .into_iter()
                .map(|line| (line.ingredient_id, line.quantity))
                .collect();
            resources.database.calculate_nutrition(&lines).await?
        } else {
            return Err(AppError::invalid_input(
                "Either recipe_id or ingredients is required",
            ));
        };
        Ok((StatusCode::OK, Json(totals)).into_response())
    }

    /// Handle GET /api/nutrition/ingredients/:id/
    async fn handle_ingredient(
        State(resources): State<Arc<ServerResources>>,
        Path(ingredient_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let nutrition = resources
            .database
            .get_ingredient_nutrition(ingredient_id)
            .await?
            .ok_or_else(|| AppError::not_found("Nutrition information"))?;
        Ok((StatusCode::OK, Json(nutrition)).into_response())
    }

    /// Handle PUT /api/nutrition/ingredients/:id/ (admin)
    async fn handle_update_ingredient(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(ingredient_id): Path<i64>,
        JsonBody(per_100g): JsonBody<NutritionFacts>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        if resources.database.get_ingredient(ingredient_id).await?.is_none() {
            return Err(AppError::not_found("Ingredient"));
        }
        let nutrition = resources
            .database
            .upsert_ingredient_nutrition(ingredient_id, &per_100g)
            .await?;
        Ok((StatusCode::OK, Json(nutrition)).into_response())
    }

    /// Handle PUT /api/nutrition/recipes/:id/ (admin)
    async fn handle_update_recipe(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
        JsonBody(facts): JsonBody<NutritionFacts>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        require_admin(&auth)?;
        if resources.database.get_recipe(recipe_id).await?.is_none() {
            return Err(AppError::not_found("Recipe"));
        }
        let nutrition = resources
            .database
            .upsert_recipe_nutrition(recipe_id, &facts)
            .await?;
        Ok((StatusCode::OK, Json(nutrition)).into_response())
    }
}
