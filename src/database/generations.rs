// ABOUTME: AI recipe generation request records and their status transitions
// ABOUTME: Lookups are always scoped to the requesting user
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::recipes::insert_recipe;
use super::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{GenerationStatus, NewRecipe, Recipe, RecipeGeneration};
use ashpazyar_core::pagination::PageParams;
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};

impl Database {
    pub(super) async fn migrate_generations(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS recipe_generations (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                prompt TEXT NOT NULL,
                status TEXT NOT NULL DEFAULT 'pending'
                    CHECK (status IN ('pending', 'processing', 'completed', 'failed')),
                recipe_id INTEGER REFERENCES recipes(id) ON DELETE SET NULL,
                error_message TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// Record a pending generation request
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn create_generation(&self, user_id: i64, prompt: &str) -> AppResult<RecipeGeneration> {
        let now = Utc::now();
        let id = sqlx::query(
            "INSERT INTO recipe_generations (user_id, prompt, status, created_at, updated_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(user_id)
        .bind(prompt)
        .bind(GenerationStatus::Pending.as_str())
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to create generation: {e}")))?
        .last_insert_rowid();

        self.get_generation(user_id, id)
            .await?
            .ok_or_else(|| AppError::internal("Generation vanished after insert"))
    }

    /// A user's generation by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_generation(&self, user_id: i64, generation_id: i64) -> AppResult<Option<RecipeGeneration>> {
        let row = sqlx::query("SELECT * FROM recipe_generations WHERE id = ? AND user_id = ?")
            .bind(generation_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get generation: {e}")))?;
        row.as_ref().map(row_to_generation).transpose()
    }

    /// A user's generations, newest first, with the total count
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn list_generations(
        &self,
        user_id: i64,
        params: PageParams,
    ) -> AppResult<(Vec<RecipeGeneration>, i64)> {
        let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM recipe_generations WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to count generations: {e}")))?;

        let rows = sqlx::query(
            r"
            SELECT * FROM recipe_generations WHERE user_id = ?
            ORDER BY created_at DESC, id DESC
            LIMIT ? OFFSET ?
            ",
        )
        .bind(user_id)
        .bind(params.limit())
        .bind(params.offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to list generations: {e}")))?;

        let generations = rows.iter().map(row_to_generation).collect::<AppResult<Vec<_>>>()?;
        Ok((generations, total))
    }

    /// Move a generation to `processing`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn mark_generation_processing(&self, generation_id: i64) -> AppResult<()> {
        self.set_generation_state(generation_id, GenerationStatus::Processing, None)
            .await
    }

    /// Store the generated recipe and mark the generation completed in one transaction
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for unknown referenced ids, `RESOURCE_NOT_FOUND`
    /// when the generation no longer exists, or a database error; nothing is
    /// written in any of these cases
    pub async fn complete_generation(&self, generation_id: i64, recipe: &NewRecipe) -> AppResult<Recipe> {
        self.validate_references(
            recipe.category_id,
            Some(&recipe.tag_ids),
            Some(&recipe.dietary_type_ids),
            Some(&recipe.ingredients),
        )
        .await?;

        let mut tx = self.pool.begin().await?;
        let recipe_id = insert_recipe(&mut tx, recipe).await?;
        let updated = sqlx::query(
            r"
            UPDATE recipe_generations
            SET status = ?, recipe_id = ?, error_message = NULL, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(GenerationStatus::Completed.as_str())
        .bind(recipe_id)
        .bind(Utc::now())
        .bind(generation_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::database(format!("Failed to complete generation: {e}")))?
        .rows_affected();
        if updated == 0 {
            return Err(AppError::not_found(format!("Generation {generation_id}")));
        }
        tx.commit().await?;

        self.get_recipe(recipe_id)
            .await?
            .ok_or_else(|| AppError::internal("Recipe vanished after insert"))
    }

    /// Mark a generation failed with a reason
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn fail_generation(&self, generation_id: i64, error_message: &str) -> AppResult<()> {
        self.set_generation_state(generation_id, GenerationStatus::Failed, Some(error_message))
            .await
    }

    async fn set_generation_state(
        &self,
        generation_id: i64,
        status: GenerationStatus,
        error_message: Option<&str>,
    ) -> AppResult<()> {
        sqlx::query(
            r"
            UPDATE recipe_generations
            SET status = ?, error_message = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(status.as_str())
        .bind(error_message)
        .bind(Utc::now())
        .bind(generation_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update generation: {e}")))?;
        Ok(())
    }
}

fn row_to_generation(row: &SqliteRow) -> AppResult<RecipeGeneration> {
    let status: String = row.try_get("status")?;
    Ok(RecipeGeneration {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        prompt: row.try_get("prompt")?,
        status: GenerationStatus::parse(&status),
        recipe_id: row.try_get("recipe_id")?,
        error_message: row.try_get("error_message")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::ErrorCode;
    use crate::models::{Difficulty, NewUser, UserRole};

    #[tokio::test]
    async fn test_generation_lifecycle_is_user_scoped() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = db
            .create_user(&NewUser {
                username: "cook".into(),
                email: "cook@example.com".into(),
                password_hash: "x".into(),
                first_name: String::new(),
                last_name: String::new(),
                student_number: None,
                role: UserRole::User,
            })
            .await
            .unwrap();

        let generation = db.create_generation(user.id, "a quick soup").await.unwrap();
        assert_eq!(generation.status, GenerationStatus::Pending);
        assert!(db.get_generation(user.id + 1, generation.id).await.unwrap().is_none());

        db.mark_generation_processing(generation.id).await.unwrap();
        db.fail_generation(generation.id, "model returned no JSON").await.unwrap();
        let failed = db.get_generation(user.id, generation.id).await.unwrap().unwrap();
        assert_eq!(failed.status, GenerationStatus::Failed);
        assert_eq!(failed.error_message.as_deref(), Some("model returned no JSON"));

        let params = PageParams::new(None, None, 20, 100);
        let (listed, total) = db.list_generations(user.id, params).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(listed[0].id, generation.id);
    }

    fn generated_recipe(author_id: i64) -> NewRecipe {
        NewRecipe {
            title: "Ash reshteh".into(),
            description: String::new(),
            instructions: "Simmer the noodles".into(),
            prep_time: 20,
            cook_time: 90,
            servings: 6,
            difficulty: Difficulty::Medium,
            image: None,
            author_id,
            category_id: None,
            is_public: false,
            tag_ids: Vec::new(),
            dietary_type_ids: Vec::new(),
            ingredients: Vec::new(),
        }
    }

    async fn recipe_count(db: &Database) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM recipes")
            .fetch_one(&db.pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_completion_stores_recipe_atomically() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = db
            .create_user(&NewUser {
                username: "cook".into(),
                email: "cook@example.com".into(),
                password_hash: "x".into(),
                first_name: String::new(),
                last_name: String::new(),
                student_number: None,
                role: UserRole::User,
            })
            .await
            .unwrap();

        // Unknown generation: the recipe insert is rolled back
        let missing = db.complete_generation(9999, &generated_recipe(user.id)).await;
        assert_eq!(missing.unwrap_err().code, ErrorCode::ResourceNotFound);
        assert_eq!(recipe_count(&db).await, 0);

        let generation = db.create_generation(user.id, "noodle soup").await.unwrap();
        db.mark_generation_processing(generation.id).await.unwrap();
        let recipe = db
            .complete_generation(generation.id, &generated_recipe(user.id))
            .await
            .unwrap();
        assert_eq!(recipe_count(&db).await, 1);

        let completed = db.get_generation(user.id, generation.id).await.unwrap().unwrap();
        assert_eq!(completed.status, GenerationStatus::Completed);
        assert_eq!(completed.recipe_id, Some(recipe.id));
        assert!(completed.error_message.is_none());
    }
}
