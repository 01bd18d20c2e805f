// ABOUTME: User account and cooking profile models
// ABOUTME: Stored records plus the insert/update payloads the database layer accepts
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use ashpazyar_core::models::{SkillLevel, UserRole};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Registered account
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Primary key
    pub id: i64,
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// University student number, unique when present
    pub student_number: Option<String>,
    /// Account role
    pub role: UserRole,
    /// Free-text biography
    pub biography: String,
    /// Avatar URL
    pub profile_picture: Option<String>,
    /// bcrypt hash, never serialized
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the account may manage catalog data and any recipe
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.role.is_admin()
    }
}

/// Cooking preferences, one per user
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    /// Owning user
    #[serde(skip_serializing)]
    pub user_id: i64,
    /// Free-form JSON object, e.g. `{"vegetarian": true}`
    pub dietary_preferences: serde_json::Value,
    /// Cuisine names
    pub favorite_cuisines: Vec<String>,
    /// Self-declared skill
    pub cooking_skill_level: SkillLevel,
    /// Creation time
    #[serde(skip_serializing)]
    pub created_at: DateTime<Utc>,
    /// Last modification time
    #[serde(skip_serializing)]
    pub updated_at: DateTime<Utc>,
}

/// User with the nested profile, as returned by `/users/me/` and recipe details
#[derive(Debug, Clone, Serialize)]
pub struct UserWithProfile {
    /// Account fields
    #[serde(flatten)]
    pub user: User,
    /// Profile, absent only for accounts created outside registration
    pub profile: Option<UserProfile>,
}

/// Insert payload for a new account
#[derive(Debug, Clone)]
pub struct NewUser {
    /// Unique login name
    pub username: String,
    /// Contact email
    pub email: String,
    /// Already-hashed password
    pub password_hash: String,
    /// Given name
    pub first_name: String,
    /// Family name
    pub last_name: String,
    /// Optional student number
    pub student_number: Option<String>,
    /// Account role
    pub role: UserRole,
}

/// Partial update of account fields; `None` leaves a column unchanged
#[derive(Debug, Clone, Default)]
pub struct UserChanges {
    /// New login name
    pub username: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New student number; `Some(None)` clears it
    pub student_number: Option<Option<String>>,
    /// New biography
    pub biography: Option<String>,
    /// New avatar URL; `Some(None)` clears it
    pub profile_picture: Option<Option<String>>,
    /// New password hash
    pub password_hash: Option<String>,
}

/// Partial update of the cooking profile
#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    /// Replacement preferences object
    pub dietary_preferences: Option<serde_json::Value>,
    /// Replacement cuisine list
    pub favorite_cuisines: Option<Vec<String>>,
    /// New skill level
    pub cooking_skill_level: Option<SkillLevel>,
}
