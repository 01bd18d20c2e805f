// ABOUTME: Recipe models: stored rows, list and detail views, ratings, and write payloads
// ABOUTME: Also defines list filters and the whitelisted ordering fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::catalog::{Category, DietaryType, Ingredient, Tag};
use super::nutrition::RecipeNutrition;
use super::users::{User, UserWithProfile};
use ashpazyar_core::models::Difficulty;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Stored recipe row
#[derive(Debug, Clone)]
pub struct Recipe {
    /// Primary key
    pub id: i64,
    /// Title, at most 200 characters
    pub title: String,
    /// Short description
    pub description: String,
    /// Step-by-step instructions
    pub instructions: String,
    /// Preparation minutes
    pub prep_time: i64,
    /// Cooking minutes
    pub cook_time: i64,
    /// Portions
    pub servings: i64,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Image URL
    pub image: Option<String>,
    /// Author user id
    pub author_id: i64,
    /// Category id
    pub category_id: Option<i64>,
    /// Authenticated detail views
    pub views_count: i64,
    /// Mean rating rounded to two decimals
    pub average_rating: f64,
    /// Number of ratings
    pub ratings_count: i64,
    /// Visible to everyone
    pub is_public: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Lightweight recipe representation used by every list endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RecipeSummary {
    /// Primary key
    pub id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Preparation minutes
    pub prep_time: i64,
    /// Cooking minutes
    pub cook_time: i64,
    /// Portions
    pub servings: i64,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Image URL
    pub image: Option<String>,
    /// Author username
    pub author: String,
    /// Category
    pub category: Option<Category>,
    /// Tags
    pub tags: Vec<Tag>,
    /// Dietary types
    pub dietary_types: Vec<DietaryType>,
    /// View counter
    pub views_count: i64,
    /// Mean rating
    pub average_rating: f64,
    /// Rating count
    pub ratings_count: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Ingredient line of a recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeIngredient {
    /// Primary key
    pub id: i64,
    /// Referenced ingredient
    pub ingredient: Ingredient,
    /// Free-text amount, at most 100 characters
    pub quantity: String,
    /// Preparation notes
    pub notes: String,
    /// Display order
    pub order: i64,
}

/// One user's rating of a recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeRating {
    /// Primary key
    pub id: i64,
    /// Rated recipe
    #[serde(skip_serializing)]
    pub recipe_id: i64,
    /// Rater
    pub user: User,
    /// 1 to 5
    pub rating: i64,
    /// Optional comment
    pub comment: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Full recipe representation for the detail endpoint
#[derive(Debug, Clone, Serialize)]
pub struct RecipeDetail {
    /// Primary key
    pub id: i64,
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Instructions
    pub instructions: String,
    /// Preparation minutes
    pub prep_time: i64,
    /// Cooking minutes
    pub cook_time: i64,
    /// Portions
    pub servings: i64,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Image URL
    pub image: Option<String>,
    /// Author with profile
    pub author: UserWithProfile,
    /// Category
    pub category: Option<Category>,
    /// Tags
    pub tags: Vec<Tag>,
    /// Dietary types
    pub dietary_types: Vec<DietaryType>,
    /// Ingredient lines in display order
    pub recipe_ingredients: Vec<RecipeIngredient>,
    /// Stored nutrition, if any
    pub nutrition: Option<RecipeNutrition>,
    /// Ratings, newest first
    pub ratings: Vec<RecipeRating>,
    /// View counter
    pub views_count: i64,
    /// Mean rating
    pub average_rating: f64,
    /// Rating count
    pub ratings_count: i64,
    /// Visible to everyone
    pub is_public: bool,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Ingredient line in a create or update request
#[derive(Debug, Clone, Deserialize)]
pub struct RecipeIngredientInput {
    /// Referenced ingredient
    pub ingredient_id: i64,
    /// Free-text amount
    #[serde(default)]
    pub quantity: String,
    /// Notes
    #[serde(default)]
    pub notes: String,
    /// Display order
    #[serde(default)]
    pub order: i64,
}

/// Insert payload for a recipe
#[derive(Debug, Clone)]
pub struct NewRecipe {
    /// Title
    pub title: String,
    /// Description
    pub description: String,
    /// Instructions
    pub instructions: String,
    /// Preparation minutes
    pub prep_time: i64,
    /// Cooking minutes
    pub cook_time: i64,
    /// Portions
    pub servings: i64,
    /// Difficulty
    pub difficulty: Difficulty,
    /// Image URL
    pub image: Option<String>,
    /// Author user id
    pub author_id: i64,
    /// Category id
    pub category_id: Option<i64>,
    /// Visible to everyone
    pub is_public: bool,
    /// Tag ids
    pub tag_ids: Vec<i64>,
    /// Dietary type ids
    pub dietary_type_ids: Vec<i64>,
    /// Ingredient lines
    pub ingredients: Vec<RecipeIngredientInput>,
}

/// Partial recipe update; set-valued fields replace the whole set when present
#[derive(Debug, Clone, Default)]
pub struct RecipeChanges {
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
    pub difficulty: Option<Difficulty>,
    /// New image; `Some(None)` clears it
    pub image: Option<Option<String>>,
    /// New category; `Some(None)` clears it
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

/// Sortable recipe columns
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecipeOrderField {
    /// Creation time
    CreatedAt,
    /// Mean rating
    AverageRating,
    /// View counter
    ViewsCount,
    /// Preparation minutes
    PrepTime,
    /// Cooking minutes
    CookTime,
}

/// Ordering of recipe lists, `-created_at` by default
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecipeOrdering {
    /// Sort column
    pub field: RecipeOrderField,
    /// Descending when true
    pub descending: bool,
}

impl Default for RecipeOrdering {
    fn default() -> Self {
        Self {
            field: RecipeOrderField::CreatedAt,
            descending: true,
        }
    }
}

impl RecipeOrdering {
    /// Parse `field` or `-field`; unknown fields fall back to the default
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (descending, name) = raw
            .strip_prefix('-')
            .map_or((false, raw), |rest| (true, rest));
        let field = match name {
            "created_at" => RecipeOrderField::CreatedAt,
            "average_rating" => RecipeOrderField::AverageRating,
            "views_count" => RecipeOrderField::ViewsCount,
            "prep_time" => RecipeOrderField::PrepTime,
            "cook_time" => RecipeOrderField::CookTime,
            _ => return Self::default(),
        };
        Self { field, descending }
    }

    /// `ORDER BY` clause over the `r` alias
    #[must_use]
    pub const fn sql(&self) -> &'static str {
        match (self.field, self.descending) {
            (RecipeOrderField::CreatedAt, true) => "r.created_at DESC, r.id DESC",
            (RecipeOrderField::CreatedAt, false) => "r.created_at ASC, r.id ASC",
            (RecipeOrderField::AverageRating, true) => "r.average_rating DESC, r.id DESC",
            (RecipeOrderField::AverageRating, false) => "r.average_rating ASC, r.id ASC",
            (RecipeOrderField::ViewsCount, true) => "r.views_count DESC, r.id DESC",
            (RecipeOrderField::ViewsCount, false) => "r.views_count ASC, r.id ASC",
            (RecipeOrderField::PrepTime, true) => "r.prep_time DESC, r.id DESC",
            (RecipeOrderField::PrepTime, false) => "r.prep_time ASC, r.id ASC",
            (RecipeOrderField::CookTime, true) => "r.cook_time DESC, r.id DESC",
            (RecipeOrderField::CookTime, false) => "r.cook_time ASC, r.id ASC",
        }
    }
}

/// Recipe list query
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    /// Authenticated caller; their private recipes are included
    pub viewer_id: Option<i64>,
    /// Category id
    pub category: Option<i64>,
    /// Difficulty
    pub difficulty: Option<Difficulty>,
    /// Recipes carrying any of these tag ids
    pub tags: Vec<i64>,
    /// Recipes carrying any of these dietary type ids
    pub dietary_types: Vec<i64>,
    /// Author id
    pub author: Option<i64>,
    /// Case-insensitive substring over title, description, tag names
    pub search: Option<String>,
    /// Sort order
    pub ordering: RecipeOrdering,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ordering_parse() {
        let ordering = RecipeOrdering::parse("-average_rating");
        assert_eq!(ordering.field, RecipeOrderField::AverageRating);
        assert!(ordering.descending);

        let ordering = RecipeOrdering::parse("prep_time");
        assert_eq!(ordering.field, RecipeOrderField::PrepTime);
        assert!(!ordering.descending);

        assert_eq!(RecipeOrdering::parse("title; DROP"), RecipeOrdering::default());
    }
}
