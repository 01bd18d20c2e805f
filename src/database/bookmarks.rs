// ABOUTME: Bookmark persistence, one row per user and recipe
// ABOUTME: Listing embeds recipe summaries, newest bookmark first
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::Bookmark;
use ashpazyar_core::pagination::PageParams;
use chrono::{DateTime, Utc};
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_bookmarks(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS bookmarks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                created_at TEXT NOT NULL,
                UNIQUE (user_id, recipe_id)
            )
            ",
        )
        .await
    }

    /// Bookmark a recipe for a user
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` when the recipe is already bookmarked
    pub async fn create_bookmark(&self, user_id: i64, recipe_id: i64) -> AppResult<Bookmark> {
        if self.is_bookmarked(user_id, recipe_id).await? {
            return Err(AppError::invalid_input("Recipe is already bookmarked"));
        }
        let id = sqlx::query("INSERT INTO bookmarks (user_id, recipe_id, created_at) VALUES (?, ?, ?)")
            .bind(user_id)
            .bind(recipe_id)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?
            .last_insert_rowid();

        self.get_bookmark(user_id, id)
            .await?
            .ok_or_else(|| AppError::internal("Bookmark vanished after insert"))
    }

    /// A user's bookmark by id; other users' bookmarks are invisible
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_bookmark(&self, user_id: i64, bookmark_id: i64) -> AppResult<Option<Bookmark>> {
        let row = sqlx::query("SELECT recipe_id, created_at FROM bookmarks WHERE id = ? AND user_id = ?")
            .bind(bookmark_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get bookmark: {e}")))?;
        let Some(row) = row else {
            return Ok(None);
        };

        let recipe_id: i64 = row.try_get("recipe_id")?;
        let created_at: DateTime<Utc> = row.try_get("created_at")?;
        Ok(self
            .recipe_summary(recipe_id)
            .await?
            .map(|recipe| Bookmark {
                id: bookmark_id,
                recipe,
                created_at,
            }))
    }

    /// A user's bookmarks, newest first, with the total count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_bookmarks(&self, user_id: i64, params: PageParams) -> AppResult<(Vec<Bookmark>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookmarks WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count bookmarks: {e}")))?;

        let rows: Vec<(i64, i64, DateTime<Utc>)> = sqlx::query_as(
            r"
            SELECT id, recipe_id, created_at FROM bookmarks
            WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list bookmarks: {e}")))?;

        let recipe_ids: Vec<i64> = rows.iter().map(|(_, recipe_id, _)| *recipe_id).collect();
        let summaries = self.recipe_summaries(&recipe_ids).await?;

        let bookmarks = rows
            .into_iter()
            .filter_map(|(id, recipe_id, created_at)| {
                summaries
                    .iter()
                    .find(|summary| summary.id == recipe_id)
                    .map(|recipe| Bookmark {
                        id,
                        recipe: recipe.clone(),
                        created_at,
                    })
            })
            .collect();
        Ok((bookmarks, total))
    }

    /// Remove a user's bookmark
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn delete_bookmark(&self, user_id: i64, bookmark_id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM bookmarks WHERE id = ? AND user_id = ?")
            .bind(bookmark_id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to delete bookmark: {e}")))?;
        Ok(result.rows_affected() > 0)
    }

    /// Whether the user has bookmarked the recipe
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn is_bookmarked(&self, user_id: i64, recipe_id: i64) -> AppResult<bool> {
        let found: Option<i64> =
            sqlx::query_scalar("SELECT id FROM bookmarks WHERE user_id = ? AND recipe_id = ?")
                .bind(user_id)
                .bind(recipe_id)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check bookmark: {e}")))?;
        Ok(found.is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, NewRecipe, NewUser, UserRole};

    #[tokio::test]
    async fn test_bookmarks_are_unique_and_private() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let mut ids = Vec::new();
        for name in ["owner", "other"] {
            let user = db
                .create_user(&NewUser {
                    username: name.into(),
                    email: format!("{name}@example.com"),
                    password_hash: "x".into(),
                    first_name: String::new(),
                    last_name: String::new(),
                    student_number: None,
                    role: UserRole::User,
                })
                .await
                .unwrap();
            ids.push(user.id);
        }
        let recipe = db
            .create_recipe(&NewRecipe {
                title: "dizi".into(),
                description: String::new(),
                instructions: "simmer".into(),
                prep_time: 20,
                cook_time: 180,
                servings: 4,
                difficulty: Difficulty::Hard,
                image: None,
                author_id: ids[0],
                category_id: None,
                is_public: true,
                tag_ids: Vec::new(),
                dietary_type_ids: Vec::new(),
                ingredients: Vec::new(),
            })
            .await
            .unwrap();

        let bookmark = db.create_bookmark(ids[0], recipe.id).await.unwrap();
        assert_eq!(bookmark.recipe.title, "dizi");
        assert!(db.is_bookmarked(ids[0], recipe.id).await.unwrap());

        let err = db.create_bookmark(ids[0], recipe.id).await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);

        assert!(db.get_bookmark(ids[1], bookmark.id).await.unwrap().is_none());
        assert!(!db.delete_bookmark(ids[1], bookmark.id).await.unwrap());

        let params = PageParams::new(None, None, 20, 100);
        let (listed, total) = db.list_bookmarks(ids[0], params).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed[0].id, bookmark.id);
        assert!(db.delete_bookmark(ids[0], bookmark.id).await.unwrap());
    }
}
