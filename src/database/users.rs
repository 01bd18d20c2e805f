// ABOUTME: User and profile persistence
// ABOUTME: Registration inserts the account and its profile in one transaction
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::{placeholders, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{
    NewUser, ProfileChanges, SkillLevel, User, UserChanges, UserProfile, UserRole, UserWithProfile,
};
use chrono::Utc;
use sqlx::{sqlite::SqliteRow, Row};
use std::collections::HashMap;

impl Database {
    pub(super) async fn migrate_users(&self) -> AppResult<()> {
        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                username TEXT NOT NULL UNIQUE,
                email TEXT NOT NULL,
                first_name TEXT NOT NULL DEFAULT '',
                last_name TEXT NOT NULL DEFAULT '',
                student_number TEXT UNIQUE,
                role TEXT NOT NULL DEFAULT 'user' CHECK (role IN ('user', 'admin')),
                biography TEXT NOT NULL DEFAULT '',
                profile_picture TEXT,
                password_hash TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await?;

        self.execute_ddl(
            r"
            CREATE TABLE IF NOT EXISTS user_profiles (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                user_id INTEGER NOT NULL UNIQUE REFERENCES users(id) ON DELETE CASCADE,
                dietary_preferences TEXT NOT NULL DEFAULT '{}',
                favorite_cuisines TEXT NOT NULL DEFAULT '[]',
                cooking_skill_level TEXT NOT NULL DEFAULT 'beginner',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            )
            ",
        )
        .await
    }

    /// Create an account together with an empty cooking profile
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for a duplicate username or student number
    pub async fn create_user(&self, new_user: &NewUser) -> AppResult<User> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let user_id = sqlx::query(
            r"
            INSERT INTO users (username, email, first_name, last_name, student_number,
                               role, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&new_user.username)
        .bind(&new_user.email)
        .bind(&new_user.first_name)
        .bind(&new_user.last_name)
        .bind(new_user.student_number.as_deref())
        .bind(new_user.role.as_str())
        .bind(&new_user.password_hash)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?
        .last_insert_rowid();

        sqlx::query(
            r"
            INSERT INTO user_profiles (user_id, created_at, updated_at)
            VALUES (?, ?, ?)
            ",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::internal("User vanished after insert"))
    }

    /// Get a user by id
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user(&self, user_id: i64) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Get a user by username
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let row = sqlx::query("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get user: {e}")))?;
        row.as_ref().map(Self::row_to_user).transpose()
    }

    /// Whether `username` is taken by an account other than `except_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn username_taken(&self, username: &str, except_id: Option<i64>) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE username = ? AND id != ?")
                .bind(username)
                .bind(except_id.unwrap_or(0))
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check username: {e}")))?;
        Ok(count > 0)
    }

    /// Whether `student_number` is taken by an account other than `except_id`
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn student_number_taken(
        &self,
        student_number: &str,
        except_id: Option<i64>,
    ) -> AppResult<bool> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE student_number = ? AND id != ?")
                .bind(student_number)
                .bind(except_id.unwrap_or(0))
                .fetch_one(&self.pool)
                .await
                .map_err(|e| AppError::database(format!("Failed to check student number: {e}")))?;
        Ok(count > 0)
    }

    /// Apply a partial update and return the fresh row
    ///
    /// # Errors
    ///
    /// Returns `RESOURCE_NOT_FOUND` for an unknown user, `INVALID_INPUT` on a
    /// uniqueness conflict
    pub async fn update_user(&self, user_id: i64, changes: &UserChanges) -> AppResult<User> {
        let current = self
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))?;

        let student_number = changes
            .student_number
            .clone()
            .unwrap_or(current.student_number);
        let profile_picture = changes
            .profile_picture
            .clone()
            .unwrap_or(current.profile_picture);

        sqlx::query(
            r"
            UPDATE users
            SET username = ?, email = ?, first_name = ?, last_name = ?, student_number = ?,
                biography = ?, profile_picture = ?, password_hash = ?, updated_at = ?
            WHERE id = ?
            ",
        )
        .bind(changes.username.as_ref().unwrap_or(&current.username))
        .bind(changes.email.as_ref().unwrap_or(&current.email))
        .bind(changes.first_name.as_ref().unwrap_or(&current.first_name))
        .bind(changes.last_name.as_ref().unwrap_or(&current.last_name))
        .bind(student_number)
        .bind(changes.biography.as_ref().unwrap_or(&current.biography))
        .bind(profile_picture)
        .bind(changes.password_hash.as_ref().unwrap_or(&current.password_hash))
        .bind(Utc::now())
        .bind(user_id)
        .execute(&self.pool)
        .await?;

        self.get_user(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("User {user_id}")))
    }

    /// Change a user's role
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn set_user_role(&self, user_id: i64, role: UserRole) -> AppResult<()> {
        sqlx::query("UPDATE users SET role = ?, updated_at = ? WHERE id = ?")
            .bind(role.as_str())
            .bind(Utc::now())
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to set role: {e}")))?;
        Ok(())
    }

    /// Get a user's cooking profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_profile(&self, user_id: i64) -> AppResult<Option<UserProfile>> {
        let row = sqlx::query("SELECT * FROM user_profiles WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to get profile: {e}")))?;
        row.as_ref().map(Self::row_to_profile).transpose()
    }

    /// Get a user together with their profile
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn get_user_with_profile(&self, user_id: i64) -> AppResult<Option<UserWithProfile>> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(None);
        };
        let profile = self.get_profile(user_id).await?;
        Ok(Some(UserWithProfile { user, profile }))
    }

    /// Users keyed by id for every id in `user_ids` that exists
    pub(super) async fn users_by_ids(&self, user_ids: &[i64]) -> AppResult<HashMap<i64, User>> {
        if user_ids.is_empty() {
            return Ok(HashMap::new());
        }
        let query = format!(
            "SELECT * FROM users WHERE id IN ({})",
            placeholders(user_ids.len())
        );
        let mut sql_query = sqlx::query(&query);
        for id in user_ids {
            sql_query = sql_query.bind(*id);
        }
        let rows = sql_query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to load users: {e}")))?;
        rows.iter()
            .map(|row| Self::row_to_user(row).map(|user| (user.id, user)))
            .collect()
    }

    /// Apply a partial profile update, creating the profile if it is missing
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn update_profile(
        &self,
        user_id: i64,
        changes: &ProfileChanges,
    ) -> AppResult<UserProfile> {
        let now = Utc::now();
        sqlx::query(
            r"
            INSERT INTO user_profiles (user_id, created_at, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(user_id) DO NOTHING
            ",
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        let current = self
            .get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile of user {user_id}")))?;

        let preferences = changes
            .dietary_preferences
            .as_ref()
            .unwrap_or(&current.dietary_preferences);
        let cuisines = changes
            .favorite_cuisines
            .as_ref()
            .unwrap_or(&current.favorite_cuisines);
        let skill = changes
            .cooking_skill_level
            .unwrap_or(current.cooking_skill_level);

        sqlx::query(
            r"
            UPDATE user_profiles
            SET dietary_preferences = ?, favorite_cuisines = ?, cooking_skill_level = ?, updated_at = ?
            WHERE user_id = ?
            ",
        )
        .bind(serde_json::to_string(preferences)?)
        .bind(serde_json::to_string(cuisines)?)
        .bind(skill.as_str())
        .bind(now)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::database(format!("Failed to update profile: {e}")))?;

        self.get_profile(user_id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Profile of user {user_id}")))
    }

    fn row_to_user(row: &SqliteRow) -> AppResult<User> {
        let role: String = row.try_get("role")?;
        Ok(User {
            id: row.try_get("id")?,
            username: row.try_get("username")?,
            email: row.try_get("email")?,
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            student_number: row.try_get("student_number")?,
            role: UserRole::parse(&role),
            biography: row.try_get("biography")?,
            profile_picture: row.try_get("profile_picture")?,
            password_hash: row.try_get("password_hash")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }

    fn row_to_profile(row: &SqliteRow) -> AppResult<UserProfile> {
        let preferences: String = row.try_get("dietary_preferences")?;
        let cuisines: String = row.try_get("favorite_cuisines")?;
        let skill: String = row.try_get("cooking_skill_level")?;
        Ok(UserProfile {
            user_id: row.try_get("user_id")?,
            dietary_preferences: serde_json::from_str(&preferences)?,
            favorite_cuisines: serde_json::from_str(&cuisines)?,
            cooking_skill_level: SkillLevel::parse(&skill).unwrap_or_default(),
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_user(username: &str, student_number: Option<&str>) -> NewUser {
        NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_owned(),
            first_name: String::new(),
            last_name: String::new(),
            student_number: student_number.map(str::to_owned),
            role: UserRole::User,
        }
    }

    #[tokio::test]
    async fn test_create_user_creates_profile() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = db.create_user(&new_user("maryam", None)).await.unwrap();

        let profile = db.get_profile(user.id).await.unwrap().unwrap();
        assert_eq!(profile.cooking_skill_level, SkillLevel::Beginner);
        assert_eq!(profile.dietary_preferences, serde_json::json!({}));
        assert!(profile.favorite_cuisines.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_username_is_invalid_input() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        db.create_user(&new_user("ali", Some("9912345"))).await.unwrap();

        let err = db.create_user(&new_user("ali", None)).await.unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);

        let err = db
            .create_user(&new_user("reza", Some("9912345")))
            .await
            .unwrap_err();
        assert_eq!(err.code, crate::errors::ErrorCode::InvalidInput);
    }

    #[tokio::test]
    async fn test_update_profile_keeps_unchanged_fields() {
        let db = Database::new("sqlite::memory:").await.unwrap();
        let user = db.create_user(&new_user("neda", None)).await.unwrap();

        db.update_profile(
            user.id,
            &ProfileChanges {
                favorite_cuisines: Some(vec!["persian".into()]),
                ..ProfileChanges::default()
            },
        )
        .await
        .unwrap();
        let profile = db
            .update_profile(
                user.id,
                &ProfileChanges {
                    cooking_skill_level: Some(SkillLevel::Advanced),
                    ..ProfileChanges::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(profile.favorite_cuisines, vec!["persian".to_owned()]);
        assert_eq!(profile.cooking_skill_level, SkillLevel::Advanced);
    }
}
