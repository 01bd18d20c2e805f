// ABOUTME: Recipe nutrition and per-100g ingredient nutrition persistence
// ABOUTME: Totals ingredient lists by scaling per-100g values with the quantity multiplier
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{placeholders, Database};
use crate::errors::{AppError, AppResult};
use crate::models::nutrition::quantity_multiplier;
use crate::models::{IngredientNutrition, NutritionFacts, RecipeNutrition};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use std::collections::HashMap;

/// Nutrient columns shared by both tables, in `NutritionFacts` field order
const NUTRIENT_COLUMNS: &str = "calories, protein, carbohydrates, fat, fiber, sugar, sodium";

impl Database {
    pub(super) async fn migrate_nutrition(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_nutrition (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL UNIQUE REFERENCES recipes(id) ON DELETE CASCADE,
                calories REAL NOT NULL DEFAULT 0,
                protein REAL NOT NULL DEFAULT 0,
                carbohydrates REAL NOT NULL DEFAULT 0,
                fat REAL NOT NULL DEFAULT 0,
                fiber REAL NOT NULL DEFAULT 0,
                sugar REAL NOT NULL DEFAULT 0,
                sodium REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_nutrition (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                ingredient_id INTEGER NOT NULL UNIQUE REFERENCES ingredients(id) ON DELETE CASCADE,
                calories REAL NOT NULL DEFAULT 0,
                protein REAL NOT NULL DEFAULT 0,
                carbohydrates REAL NOT NULL DEFAULT 0,
                fat REAL NOT NULL DEFAULT 0,
                fiber REAL NOT NULL DEFAULT 0,
                sugar REAL NOT NULL DEFAULT 0,
                sodium REAL NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// Stored nutrition of a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_recipe_nutrition(&self, recipe_id: i64) -> AppResult<Option<RecipeNutrition>> {
        let row = sqlx::query("SELECT * FROM recipe_nutrition WHERE recipe_id = ?")
            .bind(recipe_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get recipe nutrition: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(RecipeNutrition {
            id: row.try_get("id")?,
            recipe_id: row.try_get("recipe_id")?,
            facts: row_to_facts(&row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Insert or replace the nutrition of a recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_recipe_nutrition(
        &self,
        recipe_id: i64,
        facts: &NutritionFacts,
    ) -> AppResult<RecipeNutrition> {
        self.upsert_facts("recipe_nutrition", "recipe_id", recipe_id, facts)
            .await?;
        self.get_recipe_nutrition(recipe_id)
            .await?
            .ok_or_else(|| AppError::internal("Recipe nutrition vanished after write"))
    }

    /// Per-100g nutrition of an ingredient
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_ingredient_nutrition(
        &self,
        ingredient_id: i64,
    ) -> AppResult<Option<IngredientNutrition>> {
        let row = sqlx::query(
            r"
            SELECT n.*, i.id AS i_id, i.name AS i_name, i.description AS i_description,
                   i.image AS i_image, i.unit AS i_unit,
                   i.created_at AS i_created_at, i.updated_at AS i_updated_at
            FROM ingredient_nutrition n JOIN ingredients i ON i.id = n.ingredient_id
            WHERE n.ingredient_id = ?
            ",
        )
        .bind(ingredient_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to get ingredient nutrition: {e}")))?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(IngredientNutrition {
            id: row.try_get("id")?,
            ingredient: Self::row_to_ingredient(&row, "i_")?,
            per_100g: row_to_facts(&row)?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        }))
    }

    /// Insert or replace the per-100g nutrition of an ingredient
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn upsert_ingredient_nutrition(
        &self,
        ingredient_id: i64,
        per_100g: &NutritionFacts,
    ) -> AppResult<IngredientNutrition> {
        self.upsert_facts("ingredient_nutrition", "ingredient_id", ingredient_id, per_100g)
            .await?;
        self.get_ingredient_nutrition(ingredient_id)
            .await?
            .ok_or_else(|| AppError::internal("Ingredient nutrition vanished after write"))
    }

    /// Sum per-100g values over `(ingredient_id, quantity)` lines
    ///
    /// Ingredients without stored nutrition contribute nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn calculate_nutrition(&self, lines: &[(i64, String)]) -> AppResult<NutritionFacts> {
        let ids: Vec<i64> = lines.iter().map(|(id, _)| *id).collect();
        let per_100g = self.nutrition_by_ingredient(&ids).await?;

        let mut total = NutritionFacts::default();
        for (ingredient_id, quantity) in lines {
            if let Some(facts) = per_100g.get(ingredient_id) {
                total.add_scaled(facts, quantity_multiplier(quantity));
            }
        }
        Ok(total)
    }

    /// Stored nutrition of a recipe, or totals computed from its ingredient lines
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn recipe_nutrition_facts(&self, recipe_id: i64) -> AppResult<NutritionFacts> {
        if let Some(stored) = self.get_recipe_nutrition(recipe_id).await? {
            return Ok(stored.facts);
        }
        let lines: Vec<(i64, String)> = sqlx::query_as(
            "SELECT ingredient_id, quantity FROM recipe_ingredients WHERE recipe_id = ? ORDER BY sort_order",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to load recipe quantities: {e}")))?;
        self.calculate_nutrition(&lines).await
    }

    async fn nutrition_by_ingredient(&self, ids: &[i64]) -> AppResult<HashMap<i64, NutritionFacts>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!(
            "SELECT ingredient_id, {NUTRIENT_COLUMNS} FROM ingredient_nutrition WHERE ingredient_id IN ({})",
            placeholders(ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in ids {
            sql_query = sql_query.bind(*id);
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load ingredient nutrition: {e}")))?;

        rows.iter()
            .map(|row| Ok((row.try_get("ingredient_id")?, row_to_facts(row)?)))
            .collect()
    }

    async fn upsert_facts(
        &self,
        table: &'static str,
        owner_column: &'static str,
        owner_id: i64,
        facts: &NutritionFacts,
    ) -> AppResult<()> {
        let now = Utc::now();
        let query = format!(
            r"
            INSERT INTO {table} ({owner_column}, {NUTRIENT_COLUMNS}, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ON CONFLICT({owner_column}) DO UPDATE SET
                calories = excluded.calories, protein = excluded.protein,
                carbohydrates = excluded.carbohydrates, fat = excluded.fat,
                fiber = excluded.fiber, sugar = excluded.sugar, sodium = excluded.sodium,
                updated_at = excluded.updated_at
            "
        );
        sqlx::query(&query)
            .bind(owner_id)
            .bind(facts.calories)
            .bind(facts.protein)
            .bind(facts.carbohydrates)
            .bind(facts.fat)
            .bind(facts.fiber)
            .bind(facts.sugar)
            .bind(facts.sodium)
            .bind(now)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to write {table}: {e}")))?;
        Ok(())
    }
}

fn row_to_facts(row: &SqliteRow) -> AppResult<NutritionFacts> {
    Ok(NutritionFacts {
        calories: row.try_get("calories")?,
        protein: row.try_get("protein")?,
        carbohydrates: row.try_get("carbohydrates")?,
        fat: row.try_get("fat")?,
        fiber: row.try_get("fiber")?,
        sugar: row.try_get("sugar")?,
        sodium: row.try_get("sodium")?,
    })
}
