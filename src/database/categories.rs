// ABOUTME: Category, tag, and dietary type persistence
// ABOUTME: Name-ordered listings, lookups, admin inserts, and per-recipe batch loading
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{placeholders, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{Category, DietaryType, NewCatalogEntry, Tag};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use std::collections::HashMap;

impl Database {
    pub(super) async fn migrate_categories(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS categories (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                image TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS dietary_types (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL UNIQUE,
                description TEXT NOT NULL DEFAULT '',
                icon TEXT,
                created_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// All categories ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        let rows = sqlx::query("SELECT * FROM categories ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list categories: {e}")))?;
        rows.iter().map(|row| Self::row_to_category(row, "")).collect()
    }

    /// Category by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_category(&self, id: i64) -> AppResult<Option<Category>> {
        let row = sqlx::query("SELECT * FROM categories WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get category: {e}")))?;
        row.as_ref().map(|row| Self::row_to_category(row, "")).transpose()
    }

    /// Insert a category
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a duplicate name
    pub async fn create_category(&self, entry: &NewCatalogEntry) -> AppResult<Category> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO categories (name, description, image, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(entry.name.trim())
        .bind(&entry.description)
        .bind(entry.image.as_deref())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_category(id)
            .await?
            .ok_or_else(|| AppError::internal("Category vanished after insert"))
    }

    /// All tags ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_tags(&self) -> AppResult<Vec<Tag>> {
        let rows = sqlx::query("SELECT * FROM tags ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list tags: {e}")))?;
        rows.iter().map(Self::row_to_tag).collect()
    }

    /// Tag by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_tag(&self, id: i64) -> AppResult<Option<Tag>> {
        let row = sqlx::query("SELECT * FROM tags WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get tag: {e}")))?;
        row.as_ref().map(Self::row_to_tag).transpose()
    }

    /// Insert a tag
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a duplicate name
    pub async fn create_tag(&self, name: &str) -> AppResult<Tag> {
        let id = sqlx::query("INSERT INTO tags (name, created_at) VALUES (?, ?)")
            .bind(name.trim())
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.get_tag(id)
            .await?
            .ok_or_else(|| AppError::internal("Tag vanished after insert"))
    }

    /// All dietary types ordered by name
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_dietary_types(&self) -> AppResult<Vec<DietaryType>> {
        let rows = sqlx::query("SELECT * FROM dietary_types ORDER BY name")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to list dietary types: {e}")))?;
        rows.iter().map(Self::row_to_dietary_type).collect()
    }

    /// Dietary type by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_dietary_type(&self, id: i64) -> AppResult<Option<DietaryType>> {
        let row = sqlx::query("SELECT * FROM dietary_types WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get dietary type: {e}")))?;
        row.as_ref().map(Self::row_to_dietary_type).transpose()
    }

    /// Insert a dietary type; `image` carries the icon
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a duplicate name
    pub async fn create_dietary_type(&self, entry: &NewCatalogEntry) -> AppResult<DietaryType> {
        let id = sqlx::query(
            "INSERT INTO dietary_types (name, description, icon, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(entry.name.trim())
        .bind(&entry.description)
        .bind(entry.image.as_deref())
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_dietary_type(id)
            .await?
            .ok_or_else(|| AppError::internal("Dietary type vanished after insert"))
    }

    /// Tags of each recipe in `recipe_ids`, name-ordered
    pub(super) async fn tags_for_recipes(&self, recipe_ids: &[i64]) -> AppResult<HashMap<i64, Vec<Tag>>> {
        let mut by_recipe: HashMap<i64, Vec<Tag>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(by_recipe);
        }
        let query = format!(
            r"
            SELECT rt.recipe_id, t.*
            FROM recipe_tags rt JOIN tags t ON t.id = rt.tag_id
            WHERE rt.recipe_id IN ({})
            ORDER BY t.name
            ",
            placeholders(recipe_ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in recipe_ids {
            sql_query = sql_query.bind(*id);
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load recipe tags: {e}")))?;

        for row in &rows {
            let recipe_id: i64 = row.try_get("recipe_id")?;
            by_recipe.entry(recipe_id).or_default().push(Self::row_to_tag(row)?);
        }
        Ok(by_recipe)
    }

    /// Dietary types of each recipe in `recipe_ids`, name-ordered
    pub(super) async fn dietary_types_for_recipes(
        &self,
        recipe_ids: &[i64],
    ) -> AppResult<HashMap<i64, Vec<DietaryType>>> {
        let mut by_recipe: HashMap<i64, Vec<DietaryType>> = HashMap::new();
        if recipe_ids.is_empty() {
            return Ok(by_recipe);
        }
        let query = format!(
            r"
            SELECT rd.recipe_id, d.*
            FROM recipe_dietary_types rd JOIN dietary_types d ON d.id = rd.dietary_type_id
            WHERE rd.recipe_id IN ({})
            ORDER BY d.name
            ",
            placeholders(recipe_ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in recipe_ids {
            sql_query = sql_query.bind(*id);
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load recipe dietary types: {e}")))?;

        for row in &rows {
            let recipe_id: i64 = row.try_get("recipe_id")?;
            by_recipe
                .entry(recipe_id)
                .or_default()
                .push(Self::row_to_dietary_type(row)?);
        }
        Ok(by_recipe)
    }

    /// Map a category row; `prefix` selects aliased columns from joins
    pub(super) fn row_to_category(row: &SqliteRow, prefix: &str) -> AppResult<Category> {
        Ok(Category {
            id: row.try_get(format!("{prefix}id").as_str())?,
            name: row.try_get(format!("{prefix}name").as_str())?,
            description: row.try_get(format!("{prefix}description").as_str())?,
            image: row.try_get(format!("{prefix}image").as_str())?,
            created_at: row.try_get(format!("{prefix}created_at").as_str())?,
            updated_at: row.try_get(format!("{prefix}updated_at").as_str())?,
        })
    }

    fn row_to_tag(row: &SqliteRow) -> AppResult<Tag> {
        Ok(Tag {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn row_to_dietary_type(row: &SqliteRow) -> AppResult<DietaryType> {
        Ok(DietaryType {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            icon: row.try_get("icon")?,
            created_at: row.try_get("created_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_categories_are_name_ordered_and_unique() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        for name in ["soup", "dessert"] {
            db.create_category(&NewCatalogEntry {
                name: name.into(),
                ..NewCatalogEntry::default()
            })
            .await
            .unwrap();
        }

        let names: Vec<String> = db
            .list_categories()
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(names, vec!["dessert", "soup"]);

        let err = db
            .create_category(&NewCatalogEntry {
                name: "soup".into(),
                ..NewCatalogEntry::default()
            })
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }
}
