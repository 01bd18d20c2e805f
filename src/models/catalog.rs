// ABOUTME: Catalog models shared by every recipe: categories, tags, dietary types, ingredients
// ABOUTME: Also holds ingredient substitutes and the insert payloads for admin writes
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Recipe category such as "main course"
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    /// Primary key
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Image URL
    pub image: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Free-form label
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Tag {
    /// Primary key
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Diet a recipe is suitable for, e.g. vegan
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DietaryType {
    /// Primary key
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Icon URL or emoji
    pub icon: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Named catalog entry used by recipes
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Ingredient {
    /// Primary key
    pub id: i64,
    /// Unique name
    pub name: String,
    /// Description
    pub description: String,
    /// Image URL
    pub image: Option<String>,
    /// Measurement unit, `g` by default
    pub unit: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Replacement for an ingredient at a given ratio
#[derive(Debug, Clone, Serialize)]
pub struct IngredientSubstitute {
    /// Primary key
    pub id: i64,
    /// Ingredient being replaced
    pub original_ingredient: Ingredient,
    /// Replacement
    pub substitute_ingredient: Ingredient,
    /// Amount of substitute per unit of original
    pub substitution_ratio: f64,
    /// Usage notes
    pub notes: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Insert payload shared by categories and dietary types
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NewCatalogEntry {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Image URL (categories) or icon (dietary types)
    #[serde(default, alias = "icon")]
    pub image: Option<String>,
}

/// Insert payload for an ingredient
#[derive(Debug, Clone, Deserialize)]
pub struct NewIngredient {
    /// Unique name
    pub name: String,
    /// Description
    #[serde(default)]
    pub description: String,
    /// Image URL
    #[serde(default)]
    pub image: Option<String>,
    /// Measurement unit
    #[serde(default = "default_unit")]
    pub unit: String,
}

fn default_unit() -> String {
    "g".to_owned()
}

impl NewIngredient {
    /// Ingredient with only a name, as created during dataset import
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: String::new(),
            image: None,
            unit: default_unit(),
        }
    }
}

/// Insert payload for a substitute
#[derive(Debug, Clone, Deserialize)]
pub struct NewSubstitute {
    /// Replacement ingredient id
    pub substitute_ingredient_id: i64,
    /// Ratio, 1.0 when omitted
    #[serde(default = "default_ratio")]
    pub substitution_ratio: f64,
    /// Usage notes
    #[serde(default)]
    pub notes: String,
}

const fn default_ratio() -> f64 {
    1.0
}
