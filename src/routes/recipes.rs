// ABOUTME: Recipe route handlers: filtered listing, CRUD, rating, sharing and discovery
// ABOUTME: Also accepts AI generation requests and proxies semantic search to the vector server
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Recipe routes
//!
//! Visibility follows one rule everywhere: public recipes are visible to
//! anyone, private recipes only to their author. Writes require the author or
//! an admin.

use super::{
    double_option, id_list, lenient_int, paginate, query_id, query_pairs, query_value, JsonBody,
    PaginationQuery,
};
use crate::constants::recipes::{DEFAULT_SERVINGS, MAX_QUANTITY_LENGTH, MAX_TITLE_LENGTH};
use crate::errors::{AppError, AppResult};
use crate::generation::GenerationWorker;
use crate::middleware::AuthResult;
use crate::models::{
    Difficulty, NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter,
    RecipeIngredientInput, RecipeOrdering,
};
use crate::resources::ServerResources;
use crate::search_client::map_hits_to_recipe_ids;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::info;

const DEFAULT_SEMANTIC_LIMIT: usize = 10;

/// Recipe creation payload
#[derive(Debug, Clone, Deserialize)]
pub struct CreateRecipeRequest {
    /// Title, at most 200 characters
    pub title: Option<String>,
    /// Short description
    #[serde(default)]
    pub description: String,
    /// Instructions
    pub instructions: Option<String>,
    /// Preparation minutes
    #[serde(default)]
    pub prep_time: i64,
    /// Cooking minutes
    #[serde(default)]
    pub cook_time: i64,
    /// Portions
    pub servings: Option<i64>,
    /// `easy`, `medium` or `hard`
    pub difficulty: Option<String>,
    /// Image URL
    pub image: Option<String>,
    /// Category id
    pub category_id: Option<i64>,
    /// Visible to everyone; defaults to true
    pub is_public: Option<bool>,
    /// Tag ids
    #[serde(default)]
    pub tag_ids: Vec<i64>,
    /// Dietary type ids
    #[serde(default)]
    pub dietary_type_ids: Vec<i64>,
    /// Ingredient lines
    #[serde(default)]
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// Partial recipe update payload
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateRecipeRequest {
    /// New title
    pub title: Option<String>,
    /// New description
    pub description: Option<String>,
    /// New instructions
    pub instructions: Option<String>,
    /// New preparation minutes
    pub prep_time: Option<i64>,
    /// New cooking minutes
    pub cook_time: Option<i64>,
    /// New portions
    pub servings: Option<i64>,
    /// New difficulty
    pub difficulty: Option<String>,
    /// New image; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub image: Option<Option<String>>,
    /// New category; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub category_id: Option<Option<i64>>,
    /// New visibility
    pub is_public: Option<bool>,
    /// Replacement tag set
    pub tag_ids: Option<Vec<i64>>,
    /// Replacement dietary type set
    pub dietary_type_ids: Option<Vec<i64>>,
    /// Replacement ingredient lines
    pub ingredients: Option<Vec<RecipeIngredientInput>>,
}

/// `POST /api/recipes/generate/` body
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    /// Free-text description of the wanted recipe
    pub prompt: Option<String>,
}

/// `POST /api/recipes/by_ingredients/` body
#[derive(Debug, Clone, Deserialize)]
pub struct ByIngredientsRequest {
    /// Ingredient ids to match
    #[serde(default)]
    pub ingredient_ids: Vec<i64>,
}

/// `POST /api/recipes/:id/rate/` body
#[derive(Debug, Clone, Deserialize)]
pub struct RateRequest {
    /// 1 to 5; numeric strings are accepted
    #[serde(default, deserialize_with = "lenient_int")]
    pub rating: Option<i64>,
    /// Optional comment
    #[serde(default)]
    pub comment: String,
}

/// `POST /api/recipes/semantic_search/` body
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticSearchRequest {
    /// Free-text query; blank browses the vector store
    pub query: Option<String>,
    /// Canonical ingredient names every hit must contain
    #[serde(default)]
    pub include_ingredients: Option<Vec<String>>,
    /// Maximum number of vector hits
    pub limit: Option<usize>,
}

fn validate_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(AppError::missing_field("title"));
    }
    if title.chars().count() > MAX_TITLE_LENGTH {
        return Err(AppError::invalid_input(format!(
            "title must be at most {MAX_TITLE_LENGTH} characters"
        )));
    }
    Ok(())
}

fn validate_minutes(field: &str, minutes: i64) -> AppResult<()> {
    if minutes < 0 {
        return Err(AppError::invalid_input(format!("{field} must not be negative")));
    }
    Ok(())
}

fn validate_servings(servings: i64) -> AppResult<()> {
    if servings < 1 {
        return Err(AppError::invalid_input("servings must be at least 1"));
    }
    Ok(())
}

fn parse_difficulty(raw: &str) -> AppResult<Difficulty> {
    Difficulty::parse(raw).ok_or_else(|| {
        AppError::invalid_input(format!("difficulty: '{raw}' is not a valid choice"))
    })
}

fn validate_ingredient_lines(lines: &[RecipeIngredientInput]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for line in lines {
        if !seen.insert(line.ingredient_id) {
            return Err(AppError::invalid_input(format!(
                "Ingredient {} is listed more than once",
                line.ingredient_id
            )));
        }
        if line.quantity.chars().count() > MAX_QUANTITY_LENGTH {
            return Err(AppError::invalid_input(format!(
                "quantity must be at most {MAX_QUANTITY_LENGTH} characters"
            )));
        }
    }
    Ok(())
}

impl CreateRecipeRequest {
    /// Validate and convert into an insert payload authored by `author_id`
    ///
    /// # Errors
    ///
    /// Returns `MISSING_REQUIRED_FIELD` / `INVALID_INPUT` for bad values
    pub fn into_new_recipe(self, author_id: i64) -> AppResult<NewRecipe> {
        let title = self.title.unwrap_or_default();
        validate_title(&title)?;
        let instructions = self
            .instructions
            .filter(|i| !i.trim().is_empty())
            .ok_or_else(|| AppError::missing_field("instructions"))?;
        validate_minutes("prep_time", self.prep_time)?;
        validate_minutes("cook_time", self.cook_time)?;
        let servings = self.servings.unwrap_or(DEFAULT_SERVINGS);
        validate_servings(servings)?;
        let difficulty = self
            .difficulty
            .as_deref()
            .map(parse_difficulty)
            .transpose()?
            .unwrap_or_default();
        validate_ingredient_lines(&self.ingredients)?;

        Ok(NewRecipe {
            title: title.trim().to_owned(),
            description: self.description,
            instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings,
            difficulty,
            image: self.image.filter(|i| !i.is_empty()),
            author_id,
            category_id: self.category_id,
            is_public: self.is_public.unwrap_or(true),
            tag_ids: self.tag_ids,
            dietary_type_ids: self.dietary_type_ids,
            ingredients: self.ingredients,
        })
    }
}

impl UpdateRecipeRequest {
    /// Validate and convert into a partial update
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for bad values
    pub fn into_changes(self) -> AppResult<RecipeChanges> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(instructions) = &self.instructions {
            if instructions.trim().is_empty() {
                return Err(AppError::invalid_input("instructions may not be blank"));
            }
        }
        if let Some(minutes) = self.prep_time {
            validate_minutes("prep_time", minutes)?;
        }
        if let Some(minutes) = self.cook_time {
            validate_minutes("cook_time", minutes)?;
        }
        if let Some(servings) = self.servings {
            validate_servings(servings)?;
        }
        let difficulty = self.difficulty.as_deref().map(parse_difficulty).transpose()?;
        if let Some(lines) = &self.ingredients {
            validate_ingredient_lines(lines)?;
        }

        Ok(RecipeChanges {
            title: self.title.map(|t| t.trim().to_owned()),
            description: self.description,
            instructions: self.instructions,
            prep_time: self.prep_time,
            cook_time: self.cook_time,
            servings: self.servings,
            difficulty,
            image: self.image,
            category_id: self.category_id,
            is_public: self.is_public,
            tag_ids: self.tag_ids,
            dietary_type_ids: self.dietary_type_ids,
            ingredients: self.ingredients,
        })
    }
}

/// Build the list filter from raw query pairs
///
/// # Errors
///
/// Returns `INVALID_INPUT` for non-integer ids or an unknown difficulty
pub fn recipe_filter(pairs: &[(String, String)], viewer_id: Option<i64>) -> AppResult<RecipeFilter> {
    Ok(RecipeFilter {
        viewer_id,
        category: query_id(pairs, "category")?,
        difficulty: query_value(pairs, "difficulty").map(parse_difficulty).transpose()?,
        tags: id_list(pairs, "tags")?,
        dietary_types: id_list(pairs, "dietary_types")?,
        author: query_id(pairs, "author")?,
        search: query_value(pairs, "search").map(str::to_owned),
        ordering: query_value(pairs, "ordering").map(RecipeOrdering::parse).unwrap_or_default(),
    })
}

fn ensure_can_modify(auth: &AuthResult, recipe: &Recipe) -> AppResult<()> {
    if recipe.author_id == auth.user_id || auth.is_admin() {
        Ok(())
    } else {
        Err(AppError::permission_denied(
            "You do not have permission to perform this action.",
        ))
    }
}

async fn load_detail(resources: &ServerResources, recipe_id: i64) -> AppResult<RecipeDetail> {
    resources
        .database
        .recipe_detail(recipe_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))
}

async fn visible_recipe(
    resources: &ServerResources,
    recipe_id: i64,
    viewer_id: Option<i64>,
) -> AppResult<Recipe> {
    resources
        .database
        .get_visible_recipe(recipe_id, viewer_id)
        .await?
        .ok_or_else(|| AppError::not_found("Recipe"))
}

/// Recipe routes implementation
pub struct RecipeRoutes;

impl RecipeRoutes {
    /// Create all recipe routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route(
                "/api/recipes/",
                get(Self::handle_list).post(Self::handle_create),
            )
            .route("/api/recipes/generate/", post(Self::handle_generate))
            .route("/api/recipes/by_ingredients/", post(Self::handle_by_ingredients))
            .route("/api/recipes/semantic_search/", post(Self::handle_semantic_search))
            .route(
                "/api/recipes/:id/",
                get(Self::handle_detail)
                    .put(Self::handle_update)
                    .patch(Self::handle_update)
                    .delete(Self::handle_delete),
            )
            .route("/api/recipes/:id/similar/", get(Self::handle_similar))
            .route("/api/recipes/:id/rate/", post(Self::handle_rate))
            .route("/api/recipes/:id/share/", post(Self::handle_share))
            .with_state(resources)
    }

    /// Handle GET /api/recipes/
    async fn handle_list(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        uri: Uri,
        Query(pagination): Query<PaginationQuery>,
    ) -> Result<Response, AppError> {
        let viewer = resources.auth_middleware.authenticate_optional(&headers).await?;
        let filter = recipe_filter(&query_pairs(&uri), viewer.map(|auth| auth.user_id))?;
        let params = resources.page_params(pagination.page, pagination.page_size);

        let (results, count) = resources.database.list_recipes(&filter, params).await?;
        let page = paginate(&uri, params, results, count)?;
        Ok((StatusCode::OK, Json(page)).into_response())
    }

    /// Handle POST /api/recipes/
    async fn handle_create(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<CreateRecipeRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let new_recipe = request.into_new_recipe(auth.user_id)?;
        let recipe = resources.database.create_recipe(&new_recipe).await?;
        info!(recipe_id = recipe.id, author_id = auth.user_id, "Recipe created");

        let detail = load_detail(&resources, recipe.id).await?;
        Ok((StatusCode::CREATED, Json(detail)).into_response())
    }

    /// Handle GET /api/recipes/:id/
    async fn handle_detail(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let viewer = resources.auth_middleware.authenticate_optional(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, viewer.as_ref().map(|a| a.user_id)).await?;

        if let Some(auth) = &viewer {
            resources.database.touch_history(auth.user_id, recipe.id).await?;
            resources.database.increment_recipe_views(recipe.id).await?;
        }

        let detail = load_detail(&resources, recipe.id).await?;
        Ok((StatusCode::OK, Json(detail)).into_response())
    }

    /// Handle PUT/PATCH /api/recipes/:id/
    async fn handle_update(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
        JsonBody(request): JsonBody<UpdateRecipeRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, Some(auth.user_id)).await?;
        ensure_can_modify(&auth, &recipe)?;

        let changes = request.into_changes()?;
        resources.database.update_recipe(recipe.id, &changes).await?;

        let detail = load_detail(&resources, recipe.id).await?;
        Ok((StatusCode::OK, Json(detail)).into_response())
    }

    /// Handle DELETE /api/recipes/:id/
    async fn handle_delete(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, Some(auth.user_id)).await?;
        ensure_can_modify(&auth, &recipe)?;

        resources.database.delete_recipe(recipe.id).await?;
        info!(recipe_id = recipe.id, user_id = auth.user_id, "Recipe deleted");
        Ok(StatusCode::NO_CONTENT.into_response())
    }

    /// Handle POST /api/recipes/generate/
    async fn handle_generate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<GenerateRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let prompt = request
            .prompt
            .map(|p| p.trim().to_owned())
            .filter(|p| !p.is_empty())
            .ok_or_else(|| AppError::missing_field("prompt"))?;

        let generation = resources.database.create_generation(auth.user_id, &prompt).await?;
        if let Some(llm) = &resources.llm {
            GenerationWorker::new(resources.database.clone(), llm.clone()).spawn(generation.clone());
        }

        Ok((StatusCode::ACCEPTED, Json(generation)).into_response())
    }

    /// Handle POST /api/recipes/by_ingredients/
    async fn handle_by_ingredients(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<ByIngredientsRequest>,
    ) -> Result<Response, AppError> {
        if request.ingredient_ids.is_empty() {
            return Err(AppError::invalid_input("ingredient_ids is required"));
        }
        let recipes = resources
            .database
            .recipes_by_ingredients(&request.ingredient_ids)
            .await?;
        Ok((StatusCode::OK, Json(recipes)).into_response())
    }

    /// Handle GET /api/recipes/:id/similar/
    async fn handle_similar(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let viewer = resources.auth_middleware.authenticate_optional(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, viewer.map(|a| a.user_id)).await?;
        let similar = resources.database.similar_recipes(&recipe).await?;
        Ok((StatusCode::OK, Json(similar)).into_response())
    }

    /// Handle POST /api/recipes/:id/rate/
    async fn handle_rate(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
        JsonBody(request): JsonBody<RateRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, Some(auth.user_id)).await?;
        let rating = request
            .rating
            .filter(|r| (1..=5).contains(r))
            .ok_or_else(|| AppError::invalid_input("Rating must be between 1 and 5"))?;

        let (rating, created) = resources
            .database
            .upsert_rating(recipe.id, auth.user_id, rating, &request.comment)
            .await?;
        let status = if created { StatusCode::CREATED } else { StatusCode::OK };
        Ok((status, Json(rating)).into_response())
    }

    /// Handle POST /api/recipes/:id/share/
    async fn handle_share(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        Path(recipe_id): Path<i64>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let recipe = visible_recipe(&resources, recipe_id, Some(auth.user_id)).await?;

        let (share, created) = resources
            .database
            .get_or_create_share(recipe.id, auth.user_id)
            .await?;
        let body = json!({
            "id": share.id,
            "share_id": share.share_id,
            "share_url": share.share_url(),
            "recipe": share.recipe_id,
            "created_by": share.created_by,
            "view_count": share.view_count,
            "created_at": share.created_at,
            "expires_at": share.expires_at,
        });
        let status = if created { StatusCode::CREATED } else { StatusCode::OK };
        Ok((status, Json(body)).into_response())
    }

    /// Handle POST /api/recipes/semantic_search/
    async fn handle_semantic_search(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<SemanticSearchRequest>,
    ) -> Result<Response, AppError> {
        let query = request.query.ok_or_else(|| AppError::missing_field("query"))?;
        let limit = request
            .limit
            .unwrap_or(DEFAULT_SEMANTIC_LIMIT)
            .clamp(1, resources.config.max_page_size as usize);
        let include = request.include_ingredients.filter(|names| !names.is_empty());

        let hits = resources.search_client.search(query.trim(), limit, include).await;
        let recipe_ids = map_hits_to_recipe_ids(&resources.database, &hits).await?;
        let results = resources.database.recipe_summaries(&recipe_ids).await?;

        Ok((
            StatusCode::OK,
            Json(json!({
                "results": results,
                "vector_hits": hits.len(),
            })),
        )
            .into_response())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_request(title: Option<&str>, instructions: Option<&str>) -> CreateRecipeRequest {
        CreateRecipeRequest {
            title: title.map(str::to_owned),
            description: String::new(),
            instructions: instructions.map(str::to_owned),
            prep_time: 10,
            cook_time: 20,
            servings: None,
            difficulty: None,
            image: None,
            category_id: None,
            is_public: None,
            tag_ids: Vec::new(),
            dietary_type_ids: Vec::new(),
            ingredients: Vec::new(),
        }
    }

    #[test]
    fn test_create_request_defaults() {
        let recipe = create_request(Some(" Kuku Sabzi "), Some("Mix and bake"))
            .into_new_recipe(3)
            .unwrap();
        assert_eq!(recipe.title, "Kuku Sabzi");
        assert_eq!(recipe.servings, DEFAULT_SERVINGS);
        assert_eq!(recipe.difficulty, Difficulty::Medium);
        assert!(recipe.is_public);
    }

    #[test]
    fn test_create_request_requires_title_and_instructions() {
        assert!(create_request(None, Some("x")).into_new_recipe(1).is_err());
        assert!(create_request(Some("Soup"), None).into_new_recipe(1).is_err());
        let long_title = "a".repeat(MAX_TITLE_LENGTH + 1);
        assert!(create_request(Some(&long_title), Some("x")).into_new_recipe(1).is_err());
    }

    #[test]
    fn test_update_rejects_bad_values() {
        let request = UpdateRecipeRequest {
            servings: Some(0),
            ..UpdateRecipeRequest::default()
        };
        assert!(request.into_changes().is_err());

        let request = UpdateRecipeRequest {
            difficulty: Some("extreme".into()),
            ..UpdateRecipeRequest::default()
        };
        assert!(request.into_changes().is_err());
    }

    #[test]
    fn test_recipe_filter_from_query() {
        let uri: Uri = "/api/recipes/?difficulty=easy&tags=1,2&ordering=-views_count&search=%20polo%20"
            .parse()
            .unwrap();
        let filter = recipe_filter(&query_pairs(&uri), Some(9)).unwrap();
        assert_eq!(filter.viewer_id, Some(9));
        assert_eq!(filter.difficulty, Some(Difficulty::Easy));
        assert_eq!(filter.tags, vec![1, 2]);
        assert_eq!(filter.search.as_deref(), Some("polo"));
        assert!(filter.ordering.descending);

        let bad: Uri = "/api/recipes/?category=soup".parse().unwrap();
        assert!(recipe_filter(&query_pairs(&bad), None).is_err());
    }
}
