// ABOUTME: Nutrition facts for recipes and per-100g values for ingredients
// ABOUTME: Includes the gram-quantity multiplier used when totalling ingredient lists
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::catalog::Ingredient;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The seven tracked nutrient totals
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct NutritionFacts {
    /// kcal
    #[serde(default)]
    pub calories: f64,
    /// grams
    #[serde(default)]
    pub protein: f64,
    /// grams
    #[serde(default)]
    pub carbohydrates: f64,
    /// grams
    #[serde(default)]
    pub fat: f64,
    /// grams
    #[serde(default)]
    pub fiber: f64,
    /// grams
    #[serde(default)]
    pub sugar: f64,
    /// milligrams
    #[serde(default)]
    pub sodium: f64,
}

impl NutritionFacts {
    /// Add `other` scaled by `multiplier` to these totals
    pub fn add_scaled(&mut self, other: &Self, multiplier: f64) {
        self.calories += other.calories * multiplier;
        self.protein += other.protein * multiplier;
        self.carbohydrates += other.carbohydrates * multiplier;
        self.fat += other.fat * multiplier;
        self.fiber += other.fiber * multiplier;
        self.sugar += other.sugar * multiplier;
        self.sodium += other.sodium * multiplier;
    }
}

/// Stored nutrition of one recipe
#[derive(Debug, Clone, Serialize)]
pub struct RecipeNutrition {
    /// Primary key
    pub id: i64,
    /// Owning recipe
    #[serde(skip_serializing)]
    pub recipe_id: i64,
    /// Totals
    #[serde(flatten)]
    pub facts: NutritionFacts,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Per-100g nutrition of one ingredient
#[derive(Debug, Clone)]
pub struct IngredientNutrition {
    /// Primary key
    pub id: i64,
    /// Described ingredient
    pub ingredient: Ingredient,
    /// Values per 100 g
    pub per_100g: NutritionFacts,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

/// Wire shape of [`IngredientNutrition`] with `_per_100g` field names
#[derive(Serialize)]
struct IngredientNutritionBody<'a> {
    id: i64,
    ingredient: &'a Ingredient,
    calories_per_100g: f64,
    protein_per_100g: f64,
    carbohydrates_per_100g: f64,
    fat_per_100g: f64,
    fiber_per_100g: f64,
    sugar_per_100g: f64,
    sodium_per_100g: f64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl Serialize for IngredientNutrition {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        IngredientNutritionBody {
            id: self.id,
            ingredient: &self.ingredient,
            calories_per_100g: self.per_100g.calories,
            protein_per_100g: self.per_100g.protein,
            carbohydrates_per_100g: self.per_100g.carbohydrates,
            fat_per_100g: self.per_100g.fat,
            fiber_per_100g: self.per_100g.fiber,
            sugar_per_100g: self.per_100g.sugar,
            sodium_per_100g: self.per_100g.sodium,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
        .serialize(serializer)
    }
}

/// Scale factor for a free-text quantity relative to 100 g
///
/// Quantities mentioning `g` are read as grams after stripping every `g`
/// (`"250g"` gives 2.5). Anything else, including unparsable gram values,
/// counts as one 100 g portion.
#[must_use]
pub fn quantity_multiplier(quantity: &str) -> f64 {
    let lowered = quantity.to_lowercase();
    if !lowered.contains('g') {
        return 1.0;
    }
    lowered
        .replace('g', "")
        .trim()
        .parse::<f64>()
        .map_or(1.0, |grams| grams / 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quantity_multiplier() {
        assert!((quantity_multiplier("250g") - 2.5).abs() < f64::EPSILON);
        assert!((quantity_multiplier(" 50 G ") - 0.5).abs() < f64::EPSILON);
        assert!((quantity_multiplier("2 cups") - 1.0).abs() < f64::EPSILON);
        assert!((quantity_multiplier("2 kg") - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_add_scaled() {
        let per_100g = NutritionFacts {
            calories: 100.0,
            protein: 10.0,
            ..NutritionFacts::default()
        };
        let mut total = NutritionFacts::default();
        total.add_scaled(&per_100g, 2.0);
        total.add_scaled(&per_100g, 0.5);
        assert!((total.calories - 250.0).abs() < 1e-9);
        assert!((total.protein - 25.0).abs() < 1e-9);
    }
}
