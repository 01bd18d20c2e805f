// ABOUTME: Public share links for recipes, one per recipe and creator
// ABOUTME: Share ids are random UUIDs stored as text
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::RecipeShare;
use chrono::{DateTime, Utc};
use sqlx::{sqlite::SqliteRow, Row};
use uuid::Uuid;

impl Database {
    pub(super) async fn migrate_sharing(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_shares (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                share_id TEXT NOT NULL UNIQUE,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_by INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                expires_at TEXT,
                view_count INTEGER NOT NULL DEFAULT 0,
                created_at TEXT NOT NULL,
                UNIQUE (recipe_id, created_by)
            )
            ",
        )
        .await
    }

    /// Existing share of the recipe by this user, or a new one; the flag is true when created
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_or_create_share(&self, recipe_id: i64, user_id: i64) -> AppResult<(RecipeShare, bool)> {
        let existing = sqlx::query("SELECT * FROM recipe_shares WHERE recipe_id = ? AND created_by = ?")
            .bind(recipe_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up share: {e}")))?;
        if let Some(row) = existing {
            return Ok((row_to_share(&row)?, false));
        }

        let share_id = Uuid::new_v4();
        sqlx::query(
            "INSERT INTO recipe_shares (share_id, recipe_id, created_by, created_at) VALUES (?, ?, ?, ?)",
        )
        .bind(share_id.to_string())
        .bind(recipe_id)
        .bind(user_id)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        let share = self
            .get_share(share_id)
            .await?
            .ok_or_else(|| AppError::internal("Share vanished after insert"))?;
        Ok((share, true))
    }

    /// Share by its public id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_share(&self, share_id: Uuid) -> AppResult<Option<RecipeShare>> {
        let row = sqlx::query("SELECT * FROM recipe_shares WHERE share_id = ?")
            .bind(share_id.to_string())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get share: {e}")))?;
        row.as_ref().map(row_to_share).transpose()
    }

    /// Set or clear the expiry of a share link; false when the share does not exist
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn set_share_expiry(&self, share_id: Uuid, expires_at: Option<DateTime<Utc>>) -> AppResult<bool> {
        let result = sqlx::query("UPDATE recipe_shares SET expires_at = ? WHERE share_id = ?")
            .bind(expires_at)
            .bind(share_id.to_string())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to update share expiry: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Count one view of a share link and return the new count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn increment_share_views(&self, share_id: Uuid) -> AppResult<i64> {
        let count: Option<i64> = sqlx::query_scalar(
            "UPDATE recipe_shares SET view_count = view_count + 1 WHERE share_id = ? RETURNING view_count",
        )
        .bind(share_id.to_string())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to count share view: {e}")))?;
        count.ok_or_else(|| AppError::not_found("Share"))
    }
}

fn row_to_share(row: &SqliteRow) -> AppResult<RecipeShare> {
    let share_id: String = row.try_get("share_id")?;
    Ok(RecipeShare {
        id: row.try_get("id")?,
        share_id: Uuid::parse_str(&share_id)
            .map_err(|e| AppError::internal(format!("Corrupt share id {share_id}: {e}")))?,
        recipe_id: row.try_get("recipe_id")?,
        created_by: row.try_get("created_by")?,
        expires_at: row.try_get("expires_at")?,
        view_count: row.try_get("view_count")?,
        created_at: row.try_get("created_at")?,
    })
}
