// ABOUTME: Recipe view history, one row per user and recipe
// ABOUTME: Re-viewing touches viewed_at instead of inserting a new row
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::HistoryEntry;
use ashpazyar_core::pagination::PageParams;
use chrono::{DateTime, Utc};

impl Database {
    pub(super) async fn migrate_history(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_history (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                viewed_at TEXT NOT NULL,
                UNIQUE (user_id, recipe_id)
            )
            ",
        )
        .await
    }

    /// Record a view; returns the entry and whether it was newly created
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails or the recipe is gone
    pub async fn touch_history(&self, user_id: i64, recipe_id: i64) -> AppResult<(HistoryEntry, bool)> {
        let now = Utc::now();
        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM recipe_history WHERE user_id = ? AND recipe_id = ?")
                .bind(user_id)
                .bind(recipe_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to read history: {e}")))?;

        let id = if let Some(id) = existing {
            sqlx::query("UPDATE recipe_history SET viewed_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to touch history: {e}")))?;
            id
        } else {
            sqlx::query(
                r"
                INSERT INTO recipe_history (user_id, recipe_id, viewed_at) VALUES (?, ?, ?)
                ON CONFLICT(user_id, recipe_id) DO UPDATE SET viewed_at = excluded.viewed_at
                ",
            )
            .bind(user_id)
            .bind(recipe_id)
            .bind(now)
            .execute(&self.pool)
            .await?
            .last_insert_rowid()
        };

        let recipe = self
            .recipe_summary(recipe_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Recipe {recipe_id}")))?;
        Ok((
            HistoryEntry {
                id,
                recipe,
                viewed_at: now,
            },
            existing.is_none(),
        ))
    }

    /// A user's history, most recently viewed first, with the total count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_history(&self, user_id: i64, params: PageParams) -> AppResult<(Vec<HistoryEntry>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_history WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count history: {e}")))?;

        let rows: Vec<(i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT id, recipe_id, viewed_at FROM recipe_history
            WHERE user_id = ?
            ORDER BY viewed_at DESC, id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list history: {e}")))?;

        let recipe_ids: Vec<i64> = rows.iter().map(|(_, recipe_id, _)| *recipe_id).collect();
        let summaries = self.recipe_summaries(&recipe_ids).await?;

        let entries = rows
            .into_iter()
            .filter_map(|(id, recipe_id, viewed_at)| {
                summaries
                    .iter()
                    .find(|summary| summary.id == recipe_id)
                    .map(|recipe| HistoryEntry {
                        id,
                        recipe: recipe.clone(),
                        viewed_at,
                    })
            })
            .collect();
        Ok((entries, total))
    }

    /// Delete all of a user's history; returns the number of removed rows
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn clear_history(&self, user_id: i64) -> AppResult<u64> {
        let result = sqlx::query("DELETE FROM recipe_history WHERE user_id = ?")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to clear history: {e}")))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, NewRecipe, NewUser, UserRole};

    #[tokio::test]
    async fn test_touch_keeps_one_row_per_recipe() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = db
            .create_user(&NewUser {
                username: "viewer".into(),
                email: "viewer@example.com".into(),
                password_hash: "x".into(),
                first_name: String::new(),
                last_name: String::new(),
                student_number: None,
                role: UserRole::User,
            })
            .await
            .unwrap();
        let recipe = db
            .create_recipe(&NewRecipe {
                title: "tahdig".into(),
                description: String::new(),
                instructions: "crisp".into(),
                prep_time: 10,
                cook_time: 60,
                servings: 4,
                difficulty: Difficulty::Medium,
                image: None,
                author_id: user.id,
                category_id: None,
                is_public: true,
                tag_ids: Vec::new(),
                dietary_type_ids: Vec::new(),
                ingredients: Vec::new(),
            })
            .await
            .unwrap();

        let (first, created) = db.touch_history(user.id, recipe.id).await.unwrap();
        assert!(created);
        let (second, created) = db.touch_history(user.id, recipe.id).await.unwrap();
        assert!(!created);
        assert_eq!(first.id, second.id);
        assert!(second.viewed_at >= first.viewed_at);

        let params = PageParams::new(None, None, 20, 100);
        let (_, total) = db.list_history(user.id, params).await.unwrap();
        assert_eq!(total, 1);

        assert_eq!(db.clear_history(user.id).await.unwrap(), 1);
        let (entries, total) = db.list_history(user.id, params).await.unwrap();
        assert!(entries.is_empty());
        assert_eq!(total, 0);
    }
}
