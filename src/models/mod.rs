// ABOUTME: Domain models for the recipe platform
// ABOUTME: Users, catalog entries, recipes, nutrition, and per-user activity records
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Data Models
//!
//! Stored records returned by [`crate::database::Database`] and the composed
//! views (recipe summaries and details) the REST layer serializes directly.

/// Per-user activity: bookmarks, history, shares, generations
pub mod activity;
/// Categories, tags, dietary types, ingredients, substitutes
pub mod catalog;
/// Recipe and ingredient nutrition
pub mod nutrition;
/// Recipes, ratings, filters
pub mod recipes;
/// Accounts and profiles
pub mod users;

pub use activity::{Bookmark, HistoryEntry, RecipeGeneration, RecipeShare};
pub use ashpazyar_core::models::{Difficulty, GenerationStatus, SkillLevel, UserRole};
pub use catalog::{
    Category, DietaryType, Ingredient, IngredientSubstitute, NewCatalogEntry, NewIngredient,
    NewSubstitute, Tag,
};
pub use nutrition::{IngredientNutrition, NutritionFacts, RecipeNutrition};
pub use recipes::{
    NewRecipe, Recipe, RecipeChanges, RecipeDetail, RecipeFilter, RecipeIngredient,
    RecipeIngredientInput, RecipeOrdering, RecipeRating, RecipeSummary,
};
pub use users::{NewUser, ProfileChanges, User, UserChanges, UserProfile, UserWithProfile};
