// ABOUTME: Recipe rating persistence with one rating per user and recipe
// ABOUTME: Every write recomputes the recipe's average and count in the same transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::RecipeRating;
use chrono::Utc;
use sqlx::Row;

impl Database {
    pub(super) async fn migrate_ratings(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_ratings (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recipe_id INTEGER NOT NULL REFERENCES recipes(id) ON DELETE CASCADE,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                rating INTEGER NOT NULL CHECK (rating BETWEEN 1 AND 5),
                comment TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                UNIQUE (recipe_id, user_id)
            )
            ",
        )
        .await
    }

    /// Create or replace the caller's rating; returns the rating and whether it was new
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` when `rating` is outside 1..=5
    pub async fn upsert_rating(
        &self,
        recipe_id: i64,
        user_id: i64,
        rating: i64,
        comment: &str,
    ) -> AppResult<(RecipeRating, bool)> {
        if !(1..=5).contains(&rating) {
            return Err(AppError::invalid_input("rating must be between 1 and 5"));
        }

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let existing: Option<i64> =
            sqlx::query_scalar("SELECT id FROM recipe_ratings WHERE recipe_id = ? AND user_id = ?")
                .bind(recipe_id)
                .bind(user_id)
                .fetch_optional(&mut *tx)
                .await?;

        let rating_id = match existing {
            Some(id) => {
                sqlx::query("UPDATE recipe_ratings SET rating = ?, comment = ?, updated_at = ? WHERE id = ?")
                    .bind(rating)
                    .bind(comment)
                    .bind(now)
                    .bind(id)
                    .execute(&mut *tx)
                    .await?;
                id
            }
            None => sqlx::query(
                r"
                INSERT INTO recipe_ratings (recipe_id, user_id, rating, comment, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?)
                ",
            )
            .bind(recipe_id)
            .bind(user_id)
            .bind(rating)
            .bind(comment)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid(),
        };

        sqlx::query(
            r"
            UPDATE recipes SET
                average_rating = COALESCE(
                    (SELECT ROUND(AVG(rating), 2) FROM recipe_ratings WHERE recipe_id = ?1), 0),
                ratings_count = (SELECT COUNT(*) FROM recipe_ratings WHERE recipe_id = ?1)
            WHERE id = ?1
            ",
        )
        .bind(recipe_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let stored = self
            .list_ratings(recipe_id)
            .await?
            .into_iter()
            .find(|r| r.id == rating_id)
            .ok_or_else(|| AppError::internal("Rating vanished after write"))?;
        Ok((stored, existing.is_none()))
    }

    /// Ratings of a recipe, newest first
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_ratings(&self, recipe_id: i64) -> AppResult<Vec<RecipeRating>> {
        let rows = sqlx::query(
            "SELECT * FROM recipe_ratings WHERE recipe_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(recipe_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list ratings: {e}")))?;

        let user_ids = rows
            .iter()
            .map(|row| row.try_get::<i64, _>("user_id"))
            .collect::<Result<Vec<_>, _>>()?;
        let mut users = self.users_by_ids(&user_ids).await?;

        rows.iter()
            .map(|row| {
                let user_id: i64 = row.try_get("user_id")?;
                let user = users
                    .remove(&user_id)
                    .ok_or_else(|| AppError::internal(format!("Rater {user_id} missing")))?;
                Ok(RecipeRating {
                    id: row.try_get("id")?,
                    recipe_id: row.try_get("recipe_id")?,
                    user,
                    rating: row.try_get("rating")?,
                    comment: row.try_get("comment")?,
                    created_at: row.try_get("created_at")?,
                    updated_at: row.try_get("updated_at")?,
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Difficulty, NewRecipe, NewUser, UserRole};

    async fn user(db: &Database, username: &str) -> i64 {
        db.create_user(&NewUser {
            username: username.into(),
            email: format!("{username}@example.com"),
            password_hash: "x".into(),
            first_name: String::new(),
            last_name: String::new(),
            student_number: None,
            role: UserRole::User,
        })
        .await
        .unwrap()
        .id
    }

    #[tokio::test]
    async fn test_rating_recomputes_average() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let author = user(&db, "author").await;
        let first = user(&db, "first").await;
        let second = user(&db, "second").await;
        let recipe = db
            .create_recipe(&NewRecipe {
                title: "kuku".into(),
                description: String::new(),
                instructions: "fry".into(),
                prep_time: 5,
                cook_time: 15,
                servings: 2,
                difficulty: Difficulty::Easy,
                image: None,
                author_id: author,
                category_id: None,
                is_public: true,
                tag_ids: Vec::new(),
                dietary_type_ids: Vec::new(),
                ingredients: Vec::new(),
            })
            .await
            .unwrap();

        let (_, created) = db.upsert_rating(recipe.id, first, 5, "great").await.unwrap();
        assert!(created);
        db.upsert_rating(recipe.id, second, 4, "").await.unwrap();
        let (updated, created) = db.upsert_rating(recipe.id, second, 2, "meh").await.unwrap();
        assert!(!created);
        assert_eq!(updated.rating, 2);
        assert_eq!(updated.user.username, "second");

        let stored = db.get_recipe(recipe.id).await.unwrap().unwrap();
        assert_eq!(stored.ratings_count, 2);
        assert!((stored.average_rating - 3.5).abs() < 1e-9);

        let err = db.upsert_rating(recipe.id, first, 6, "").await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }
}
