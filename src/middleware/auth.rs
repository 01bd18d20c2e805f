// ABOUTME: Bearer-token authentication for REST handlers, required and optional variants
// ABOUTME: Validates access tokens, loads the caller, and guards admin-only actions
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use crate::auth::AuthManager;
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::User;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use std::sync::Arc;

/// Authenticated caller
#[derive(Debug, Clone)]
pub struct AuthResult {
    /// Caller id
    pub user_id: i64,
    /// Current account row
    pub user: User,
}

impl AuthResult {
    /// Whether the caller may manage catalog data and any recipe
    #[must_use]
    pub const fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Raw token from an `Authorization: Bearer` header
#[must_use]
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Resolves `Authorization` headers to users
#[derive(Clone)]
pub struct AuthMiddleware {
    auth_manager: Arc<AuthManager>,
    database: Arc<Database>,
}

impl AuthMiddleware {
    /// Create the middleware
    #[must_use]
    pub const fn new(auth_manager: Arc<AuthManager>, database: Arc<Database>) -> Self {
        Self {
            auth_manager,
            database,
        }
    }

    /// Authenticate a request that must carry an access token
    ///
    /// # Errors
    ///
    /// Returns `AuthRequired` without a header, `AuthInvalid` for a malformed
    /// header, an invalid token or a deleted user, and `AuthExpired` for an
    /// expired token
    #[tracing::instrument(
        skip(self, headers),
        fields(user_id = tracing::field::Empty, success = tracing::field::Empty)
    )]
    pub async fn authenticate_request(&self, headers: &HeaderMap) -> AppResult<AuthResult> {
        let Some(header) = headers.get(AUTHORIZATION) else {
            tracing::Span::current().record("success", false);
            return Err(AppError::auth_required());
        };

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                tracing::warn!("Authentication failed: authorization header is not a bearer token");
                AppError::auth_invalid("Authorization header must be 'Bearer <token>'")
            })?;

        match self.authenticate_jwt_token(token).await {
            Ok(result) => {
                tracing::Span::current()
                    .record("user_id", result.user_id)
                    .record("success", true);
                tracing::debug!(user_id = result.user_id, "JWT authentication successful");
                Ok(result)
            }
            Err(e) => {
                tracing::Span::current().record("success", false);
                tracing::warn!("JWT authentication failed: {}", e.message);
                Err(e)
            }
        }
    }

    /// Authenticate when a token is present; anonymous requests yield `None`
    ///
    /// A token that is present but invalid is still rejected.
    ///
    /// # Errors
    ///
    /// Same as [`Self::authenticate_request`] when a header is present
    pub async fn authenticate_optional(&self, headers: &HeaderMap) -> AppResult<Option<AuthResult>> {
        if headers.contains_key(AUTHORIZATION) {
            self.authenticate_request(headers).await.map(Some)
        } else {
            Ok(None)
        }
    }

    async fn authenticate_jwt_token(&self, token: &str) -> AppResult<AuthResult> {
        let claims = self.auth_manager.validate_access_token(token)?;
        let user_id = claims.user_id()?;

        let user = self
            .database
            .get_user(user_id)
            .await?
            .ok_or_else(|| AppError::auth_invalid("User not found"))?;

        Ok(AuthResult { user_id, user })
    }
}

/// Require admin privileges for the caller
///
/// # Errors
///
/// Returns `PermissionDenied` (403) for non-admin users
pub fn require_admin(auth: &AuthResult) -> AppResult<()> {
    if auth.is_admin() {
        Ok(())
    } else {
        tracing::warn!(user_id = auth.user_id, "Non-admin user attempted an admin action");
        Err(AppError::permission_denied("Admin privileges required"))
    }
}
