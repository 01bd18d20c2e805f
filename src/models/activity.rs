// ABOUTME: Per-user activity models: bookmarks, view history, share links, AI generations
// ABOUTME: Records reference recipes by id; list views embed recipe summaries
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::recipes::RecipeSummary;
use ashpazyar_core::models::GenerationStatus;
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

/// Saved recipe
#[derive(Debug, Clone, Serialize)]
pub struct Bookmark {
    /// Primary key
    pub id: i64,
    /// Saved recipe
    pub recipe: RecipeSummary,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

/// Viewed recipe, one row per user and recipe
#[derive(Debug, Clone, Serialize)]
pub struct HistoryEntry {
    /// Primary key
    pub id: i64,
    /// Viewed recipe
    pub recipe: RecipeSummary,
    /// Most recent view
    pub viewed_at: DateTime<Utc>,
}

/// Public link to a recipe
#[derive(Debug, Clone)]
pub struct RecipeShare {
    /// Primary key
    pub id: i64,
    /// Opaque public identifier
    pub share_id: Uuid,
    /// Shared recipe
    pub recipe_id: i64,
    /// Creator user id
    pub created_by: i64,
    /// Link stops working after this instant
    pub expires_at: Option<DateTime<Utc>>,
    /// Times the link was opened
    pub view_count: i64,
    /// Creation time
    pub created_at: DateTime<Utc>,
}

impl RecipeShare {
    /// Whether the link has passed its expiry
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }

    /// Relative URL at which the share can be viewed
    #[must_use]
    pub fn share_url(&self) -> String {
        format!("/api/share/{}/", self.share_id)
    }
}

/// AI recipe generation request
#[derive(Debug, Clone, Serialize)]
pub struct RecipeGeneration {
    /// Primary key
    pub id: i64,
    /// Requesting user id
    #[serde(rename = "user")]
    pub user_id: i64,
    /// Prompt text
    pub prompt: String,
    /// Lifecycle state
    pub status: GenerationStatus,
    /// Resulting recipe id once completed
    #[serde(skip_serializing)]
    pub recipe_id: Option<i64>,
    /// Failure reason
    pub error_message: Option<String>,
    /// Creation time
    pub created_at: DateTime<Utc>,
    /// Last state change
    pub updated_at: DateTime<Utc>,
}
