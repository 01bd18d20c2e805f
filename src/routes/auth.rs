// ABOUTME: Authentication route handlers: registration, JWT issue and refresh, account and profile
// ABOUTME: AuthService holds the business rules; AuthRoutes maps HTTP onto it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Authentication routes
//!
//! Registration returns a token pair straight away. Access tokens carry the
//! username and email as extra claims; refresh tokens only buy new access
//! tokens.

use super::{double_option, JsonBody};
use crate::auth::{hash_password, validate_password_strength, verify_password};
use crate::errors::{AppError, AppResult};
use crate::logging::AppLogger;
use crate::models::{NewUser, ProfileChanges, SkillLevel, UserChanges, UserProfile, UserRole, UserWithProfile};
use crate::resources::ServerResources;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// User registration request
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// Unique login name
    pub username: Option<String>,
    /// Contact email
    pub email: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
    /// Must equal `password`
    pub password_confirmation: Option<String>,
    /// Given name
    #[serde(default)]
    pub first_name: String,
    /// Family name
    #[serde(default)]
    pub last_name: String,
    /// Optional student number
    #[serde(default)]
    pub student_number: Option<String>,
}

/// Registration response with the new account and its tokens
#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    /// Created account
    pub user: UserWithProfile,
    /// Refresh token
    pub refresh: String,
    /// Access token
    pub access: String,
}

/// Login request payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// Login name
    pub username: Option<String>,
    /// Plain-text password
    pub password: Option<String>,
}

/// Refresh token request payload
#[derive(Debug, Clone, Deserialize)]
pub struct RefreshTokenRequest {
    /// Refresh token
    pub refresh: Option<String>,
}

/// Partial update of the caller's account
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateUserRequest {
    /// New login name
    pub username: Option<String>,
    /// New email
    pub email: Option<String>,
    /// New given name
    pub first_name: Option<String>,
    /// New family name
    pub last_name: Option<String>,
    /// New student number; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub student_number: Option<Option<String>>,
    /// New biography
    pub biography: Option<String>,
    /// New avatar URL; `null` clears it
    #[serde(default, deserialize_with = "double_option")]
    pub profile_picture: Option<Option<String>>,
    /// New password
    pub password: Option<String>,
    /// Must equal `password`
    pub password_confirmation: Option<String>,
}

/// Partial update of the caller's cooking profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfileUpdateRequest {
    /// Replacement preferences object
    pub dietary_preferences: Option<Value>,
    /// Replacement cuisine list
    pub favorite_cuisines: Option<Vec<String>>,
    /// `beginner`, `intermediate` or `advanced`
    pub cooking_skill_level: Option<String>,
}

impl ProfileUpdateRequest {
    fn into_changes(self) -> AppResult<ProfileChanges> {
        let dietary_preferences = match self.dietary_preferences {
            Some(value @ Value::Object(_)) => Some(value),
            Some(_) => {
                return Err(AppError::invalid_input(
                    "dietary_preferences must be a JSON object",
                ))
            }
            None => None,
        };
        let cooking_skill_level = self
            .cooking_skill_level
            .map(|level| {
                SkillLevel::parse(&level).ok_or_else(|| {
                    AppError::invalid_input(format!(
                        "cooking_skill_level: '{level}' is not a valid choice"
                    ))
                })
            })
            .transpose()?;

        Ok(ProfileChanges {
            dietary_preferences,
            favorite_cuisines: self.favorite_cuisines,
            cooking_skill_level,
        })
    }
}

/// Minimal email shape check: one `@`, non-empty local part, dotted domain
#[must_use]
pub fn is_valid_email(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace)
}

fn required(value: Option<String>, field: &str) -> AppResult<String> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::missing_field(field))
}

/// Authentication service for business logic
#[derive(Clone)]
pub struct AuthService {
    resources: Arc<ServerResources>,
}

impl AuthService {
    /// Create the service
    #[must_use]
    pub const fn new(resources: Arc<ServerResources>) -> Self {
        Self { resources }
    }

    /// Register an account, create its profile, and issue tokens
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` / `MISSING_REQUIRED_FIELD` for bad payloads,
    /// duplicate usernames or student numbers
    pub async fn register(&self, request: RegisterRequest) -> AppResult<RegisterResponse> {
        let username = required(request.username, "username")?.trim().to_owned();
        let email = required(request.email, "email")?.trim().to_owned();
        let password = required(request.password, "password")?;
        let confirmation = required(request.password_confirmation, "password_confirmation")?;

        tracing::info!(username = %username, "User registration attempt");

        if password != confirmation {
            return Err(AppError::invalid_input("Password fields didn't match."));
        }
        if !is_valid_email(&email) {
            return Err(AppError::invalid_input("Enter a valid email address."));
        }
        validate_password_strength(&password)?;

        let database = &self.resources.database;
        if database.username_taken(&username, None).await? {
            return Err(AppError::invalid_input(
                "A user with that username already exists.",
            ));
        }
        let student_number = request
            .student_number
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty());
        if let Some(number) = &student_number {
            if database.student_number_taken(number, None).await? {
                return Err(AppError::invalid_input(
                    "A user with this student number already exists.",
                ));
            }
        }

        let user = database
            .create_user(&NewUser {
                username,
                email,
                password_hash: hash_password(&password).await?,
                first_name: request.first_name,
                last_name: request.last_name,
                student_number,
                role: UserRole::User,
            })
            .await?;
        let tokens = self.resources.auth_manager.generate_token_pair(&user)?;
        AppLogger::log_auth_event(&user.username, "register", true, None);

        let profile = database.get_profile(user.id).await?;
        Ok(RegisterResponse {
            user: UserWithProfile { user, profile },
            refresh: tokens.refresh,
            access: tokens.access,
        })
    }

    /// Exchange username and password for a token pair
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` for unknown users or wrong passwords
    pub async fn login(&self, request: LoginRequest) -> AppResult<Value> {
        let username = required(request.username, "username")?;
        let password = required(request.password, "password")?;

        let Some(user) = self.resources.database.get_user_by_username(&username).await? else {
            AppLogger::log_auth_event(&username, "login", false, Some("unknown user"));
            return Err(AppError::auth_invalid(
                "No active account found with the given credentials",
            ));
        };
        if !verify_password(&password, &user.password_hash).await? {
            AppLogger::log_auth_event(&username, "login", false, Some("wrong password"));
            return Err(AppError::auth_invalid(
                "No active account found with the given credentials",
            ));
        }

        let tokens = self.resources.auth_manager.generate_token_pair(&user)?;
        AppLogger::log_auth_event(&user.username, "login", true, None);
        Ok(serde_json::json!({
            "access": tokens.access,
            "refresh": tokens.refresh,
        }))
    }

    /// Issue a new access token for a valid refresh token
    ///
    /// # Errors
    ///
    /// Returns `AUTH_INVALID` / `AUTH_EXPIRED` for unusable tokens or deleted users
    pub async fn refresh_token(&self, request: RefreshTokenRequest) -> AppResult<Value> {
        let refresh = required(request.refresh, "refresh")?;
        let claims = self.resources.auth_manager.validate_refresh_token(&refresh)?;

        let user = self
            .resources
            .database
            .get_user(claims.user_id()?)
            .await?
            .ok_or_else(|| AppError::auth_invalid("User not found"))?;

        let access = self.resources.auth_manager.generate_access_token(&user)?;
        AppLogger::log_auth_event(&user.username, "refresh", true, None);
        Ok(serde_json::json!({ "access": access }))
    }

    /// Apply a partial account update for `user_id`
    ///
    /// # Errors
    ///
    /// Returns `INVALID_INPUT` for mismatched passwords, weak passwords,
    /// malformed emails or taken usernames / student numbers
    pub async fn update_user(&self, user_id: i64, request: UpdateUserRequest) -> AppResult<UserWithProfile> {
        let database = &self.resources.database;

        if let Some(username) = &request.username {
            if username.trim().is_empty() {
                return Err(AppError::invalid_input("username may not be blank"));
            }
            if database.username_taken(username.trim(), Some(user_id)).await? {
                return Err(AppError::invalid_input(
                    "A user with that username already exists.",
                ));
            }
        }
        if let Some(email) = &request.email {
            if !is_valid_email(email.trim()) {
                return Err(AppError::invalid_input("Enter a valid email address."));
            }
        }
        let student_number = request
            .student_number
            .map(|number| number.map(|n| n.trim().to_owned()).filter(|n| !n.is_empty()));
        if let Some(Some(number)) = &student_number {
            if database.student_number_taken(number, Some(user_id)).await? {
                return Err(AppError::invalid_input(
                    "A user with this student number already exists.",
                ));
            }
        }

        let password_hash = match (request.password, request.password_confirmation) {
            (None, _) => None,
            (Some(password), Some(confirmation)) if password == confirmation => {
                validate_password_strength(&password)?;
                Some(hash_password(&password).await?)
            }
            (Some(_), _) => return Err(AppError::invalid_input("Password fields didn't match.")),
        };

        let changes = UserChanges {
            username: request.username.map(|u| u.trim().to_owned()),
            email: request.email.map(|e| e.trim().to_owned()),
            first_name: request.first_name,
            last_name: request.last_name,
            student_number,
            biography: request.biography,
            profile_picture: request.profile_picture,
            password_hash,
        };
        let user = database.update_user(user_id, &changes).await?;
        let profile = database.get_profile(user_id).await?;
        Ok(UserWithProfile { user, profile })
    }

    /// Current profile, created on first access for accounts without one
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails
    pub async fn profile(&self, user_id: i64) -> AppResult<UserProfile> {
        match self.resources.database.get_profile(user_id).await? {
            Some(profile) => Ok(profile),
            None => {
                self.resources
                    .database
                    .update_profile(user_id, &ProfileChanges::default())
                    .await
            }
        }
    }
}

/// Authentication routes implementation
pub struct AuthRoutes;

impl AuthRoutes {
    /// Create all authentication routes
    pub fn routes(resources: Arc<ServerResources>) -> Router {
        Router::new()
            .route("/api/auth/users/", post(Self::handle_register))
            .route("/api/auth/jwt/create/", post(Self::handle_login))
            .route("/api/auth/jwt/refresh/", post(Self::handle_refresh))
            .route(
                "/api/auth/users/me/",
                get(Self::handle_get_me)
                    .put(Self::handle_update_me)
                    .patch(Self::handle_update_me),
            )
            .route(
                "/api/auth/profile/",
                get(Self::handle_get_profile)
                    .put(Self::handle_update_profile)
                    .patch(Self::handle_update_profile),
            )
            .route(
                "/api/auth/dietary-preferences/",
                get(Self::handle_get_dietary_preferences).put(Self::handle_update_dietary_preferences),
            )
            .with_state(resources)
    }

    /// Handle POST /api/auth/users/ - Register
    async fn handle_register(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<RegisterRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).register(request).await?;
        Ok((StatusCode::CREATED, Json(response)).into_response())
    }

    /// Handle POST /api/auth/jwt/create/ - Login
    async fn handle_login(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<LoginRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).login(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle POST /api/auth/jwt/refresh/ - Refresh access token
    async fn handle_refresh(
        State(resources): State<Arc<ServerResources>>,
        JsonBody(request): JsonBody<RefreshTokenRequest>,
    ) -> Result<Response, AppError> {
        let response = AuthService::new(resources).refresh_token(request).await?;
        Ok((StatusCode::OK, Json(response)).into_response())
    }

    /// Handle GET /api/auth/users/me/
    async fn handle_get_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let profile = resources.database.get_profile(auth.user_id).await?;
        let body = UserWithProfile {
            user: auth.user,
            profile,
        };
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle PUT/PATCH /api/auth/users/me/
    async fn handle_update_me(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<UpdateUserRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let body = AuthService::new(resources)
            .update_user(auth.user_id, request)
            .await?;
        Ok((StatusCode::OK, Json(body)).into_response())
    }

    /// Handle GET /api/auth/profile/
    async fn handle_get_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let profile = AuthService::new(resources).profile(auth.user_id).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle PUT/PATCH /api/auth/profile/
    async fn handle_update_profile(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<ProfileUpdateRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let changes = request.into_changes()?;
        let profile = resources.database.update_profile(auth.user_id, &changes).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle GET /api/auth/dietary-preferences/
    async fn handle_get_dietary_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let profile = AuthService::new(resources).profile(auth.user_id).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }

    /// Handle PUT /api/auth/dietary-preferences/
    async fn handle_update_dietary_preferences(
        State(resources): State<Arc<ServerResources>>,
        headers: HeaderMap,
        JsonBody(request): JsonBody<ProfileUpdateRequest>,
    ) -> Result<Response, AppError> {
        let auth = resources.auth_middleware.authenticate_request(&headers).await?;
        let changes = request.into_changes()?;
        let profile = resources.database.update_profile(auth.user_id, &changes).await?;
        Ok((StatusCode::OK, Json(profile)).into_response())
    }
}
