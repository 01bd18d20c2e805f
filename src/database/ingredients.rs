// ABOUTME: Ingredient and ingredient-substitute persistence
// ABOUTME: Paginated search, name lookups, get-or-create for imports, substitute pairs
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{bind_all, BindValue, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Ingredient, IngredientSubstitute, NewIngredient, NewSubstitute};
use ashpazyar_core::pagination::PageParams;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

/// Columns of both sides of a substitute pair, aliased `o_` and `s_`
const SUBSTITUTE_SELECT: &str = r"
    SELECT s.id AS sub_id, s.substitution_ratio, s.notes AS sub_notes, s.created_at AS sub_created_at,
           o.id AS o_id, o.name AS o_name, o.description AS o_description, o.image AS o_image,
           o.unit AS o_unit, o.created_at AS o_created_at, o.updated_at AS o_updated_at,
           r.id AS s_id, r.name AS s_name, r.description AS s_description, r.image AS s_image,
           r.unit AS s_unit, r.created_at AS s_created_at, r.updated_at AS s_updated_at
    FROM ingredient_substitutes s
    JOIN ingredients o ON o.id = s.original_ingredient_id
    JOIN ingredients r ON r.id = s.substitute_ingredient_id
";

impl Database {
    pub(super) async fn migrate_ingredients(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS ingredients (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                image TEXT,
                unit TEXT NOT NULL DEFAULT 'g',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS ingredient_substitutes (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                original_ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                substitute_ingredient_id INTEGER NOT NULL REFERENCES ingredients(id) ON DELETE CASCADE,
                substitution_ratio REAL NOT NULL DEFAULT 1.0,
                notes TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                UNIQUE (original_ingredient_id, substitute_ingredient_id)
            )
            ",
        )
        .await
    }

    /// Paginated ingredients, optionally filtered by name/description substring
    ///
    /// `ordering` accepts `name`, `created_at` and their `-` forms; anything
    /// else orders by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_ingredients(
        &self,
        search: Option<&str>,
        ordering: Option<&str>,
        params: PageParams,
    ) -> AppResult<(Vec<Ingredient>, i64)> {
        let mut where_clause = String::from(" WHERE 1=1");
        let mut bind_values = Vec::new();
        if let Some(term) = search.map(str::trim).filter(|t| !t.is_empty()) {
            where_clause.push_str(
                " AND (instr(LOWER(name), ?) > 0 OR instr(LOWER(description), ?) > 0)",
            );
            let term = term.to_ascii_lowercase();
            bind_values.push(BindValue::Text(term.clone()));
            bind_values.push(BindValue::Text(term));
        }

        let order_by = match ordering.map(str::trim) {
            Some("created_at") => "created_at ASC, id ASC",
            Some("-created_at") => "created_at DESC, id DESC",
            Some("-name") => "name DESC",
            _ => "name ASC",
        };

        let count_query = format!("SELECT COUNT(*) AS total FROM ingredients{where_clause}");
        let total: i64 = bind_all(sqlx::query(&count_query), &bind_values)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count ingredients: {e}")))?
            .try_get("total")?;

        let list_query =
            format!("SELECT * FROM ingredients{where_clause} ORDER BY {order_by} LIMIT ? OFFSET ?");
        let rows = bind_all(sqlx::query(&list_query), &bind_values)
            .bind(params.limit())
            .bind(params.offset())
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list ingredients: {e}")))?;

        let ingredients = rows
            .iter()
            .map(|row| Self::row_to_ingredient(row, ""))
            .collect::<AppResult<Vec<_>>>()?;
        Ok((ingredients, total))
    }

    /// Ingredients whose name contains `query`, case-insensitively
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn search_ingredients(&self, query: &str) -> AppResult<Vec<Ingredient>> {
        let rows =
            sqlx::query("SELECT * FROM ingredients WHERE instr(LOWER(name), ?) > 0 ORDER BY name")
                .bind(query.trim().to_ascii_lowercase())
                .fetch_all(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to search ingredients: {e}")))?;
        rows.iter().map(|row| Self::row_to_ingredient(row, "")).collect()
    }

    /// Ingredient by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_ingredient(&self, id: i64) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query("SELECT * FROM ingredients WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get ingredient: {e}")))?;
        row.as_ref().map(|row| Self::row_to_ingredient(row, "")).transpose()
    }

    /// Ingredient by exact name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_ingredient_by_name(&self, name: &str) -> AppResult<Option<Ingredient>> {
        let row = sqlx::query("SELECT * FROM ingredients WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get ingredient: {e}")))?;
        row.as_ref().map(|row| Self::row_to_ingredient(row, "")).transpose()
    }

    /// Insert an ingredient
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a duplicate name
    pub async fn create_ingredient(&self, ingredient: &NewIngredient) -> AppResult<Ingredient> {
        let now = Utc::now();
        let id = sqlx::query(
            r"
            INSERT INTO ingredients (name, description, image, unit, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(ingredient.name.trim())
        .bind(&ingredient.description)
        .bind(ingredient.image.as_deref())
        .bind(&ingredient.unit)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_ingredient(id)
            .await?
            .ok_or_else(|| AppError::internal("Ingredient vanished after insert"))
    }

    /// Return the ingredient named `name`, creating it if absent
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_or_create_ingredient(&self, name: &str) -> AppResult<(Ingredient, bool)> {
        if let Some(existing) = self.get_ingredient_by_name(name).await? {
            return Ok((existing, false));
        }
        let created = self.create_ingredient(&NewIngredient::named(name)).await?;
        Ok((created, true))
    }

    /// Substitutes registered for `ingredient_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_substitutes(&self, ingredient_id: i64) -> AppResult<Vec<IngredientSubstitute>> {
        let query = format!("{SUBSTITUTE_SELECT} WHERE s.original_ingredient_id = ? ORDER BY r.name");
        let rows = sqlx::query(&query)
            .bind(ingredient_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get substitutes: {e}")))?;
        rows.iter().map(Self::row_to_substitute).collect()
    }

    /// Register a substitute for `ingredient_id`
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown original, `INVALID_INPUT`
    /// for an unknown or self-referencing substitute or a duplicate pair
    pub async fn add_substitute(
        &self,
        ingredient_id: i64,
        substitute: &NewSubstitute,
    ) -> AppResult<IngredientSubstitute> {
        if self.get_ingredient(ingredient_id).await?.is_none() {
            return Err(AppError::not_found(format!("Ingredient {ingredient_id}")));
        }
        if substitute.substitute_ingredient_id == ingredient_id {
            return Err(AppError::invalid_input("An ingredient cannot substitute itself"));
        }
        if substitute.substitution_ratio <= 0.0 {
            return Err(AppError::invalid_input("substitution_ratio must be positive"));
        }
        self.require_ids("ingredients", "ingredient", &[substitute.substitute_ingredient_id])
            .await?;

        let id = sqlx::query(
            r"
            INSERT INTO ingredient_substitutes
                (original_ingredient_id, substitute_ingredient_id, substitution_ratio, notes, created_at)
            VALUES (?, ?, ?, ?, ?)
            ",
        )
        .bind(ingredient_id)
        .bind(substitute.substitute_ingredient_id)
        .bind(substitute.substitution_ratio)
        .bind(&substitute.notes)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        let query = format!("{SUBSTITUTE_SELECT} WHERE s.id = ?");
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load substitute: {e}")))?;
        Self::row_to_substitute(&row)
    }

    /// Map an ingredient row; `prefix` selects aliased columns from joins
    pub(super) fn row_to_ingredient(row: &SqliteRow, prefix: &str) -> AppResult<Ingredient> {
        Ok(Ingredient {
            id: row.try_get(format!("{prefix}id").as_str())?,
            name: row.try_get(format!("{prefix}name").as_str())?,
            description: row.try_get(format!("{prefix}description").as_str())?,
            image: row.try_get(format!("{prefix}image").as_str())?,
            unit: row.try_get(format!("{prefix}unit").as_str())?,
            created_at: row.try_get(format!("{prefix}created_at").as_str())?,
            updated_at: row.try_get(format!("{prefix}updated_at").as_str())?,
        })
    }

    fn row_to_substitute(row: &SqliteRow) -> AppResult<IngredientSubstitute> {
        Ok(IngredientSubstitute {
            id: row.try_get("sub_id")?,
            original_ingredient: Self::row_to_ingredient(row, "o_")?,
            substitute_ingredient: Self::row_to_ingredient(row, "s_")?,
            substitution_ratio: row.try_get("substitution_ratio")?,
            notes: row.try_get("sub_notes")?,
            created_at: row.try_get("sub_created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_search_and_substitutes() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let butter = db.create_ingredient(&NewIngredient::named("Butter")).await.unwrap();
        let oil = db.create_ingredient(&NewIngredient::named("Olive Oil")).await.unwrap();

        let found = db.search_ingredients("butt").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, butter.id);

        let sub = db
            .add_substitute(
                butter.id,
                &NewSubstitute {
                    substitute_ingredient_id: oil.id,
                    substitution_ratio: 0.75,
                    notes: String::new(),
                },
            )
            .await
            .unwrap();
        assert_eq!(sub.substitute_ingredient.name, "Olive Oil");

        let subs = db.get_substitutes(butter.id).await.unwrap();
        assert_eq!(subs.len(), 1);
        assert!((subs[0].substitution_ratio - 0.75).abs() < f64::EPSILON);
        assert!(db.get_substitutes(oil.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_or_create_is_idempotent() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let (first, created) = db.get_or_create_ingredient("نمک").await.unwrap();
        assert!(created);
        let (second, created) = db.get_or_create_ingredient("نمک").await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert_eq!(second.unit, "g");
    }
}
