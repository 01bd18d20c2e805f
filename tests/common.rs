// ABOUTME: Shared test utilities and setup functions for integration tests
// ABOUTME: In-memory database resources, quiet logging, and user/token/recipe helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors
#![allow(
    dead_code,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::must_use_candidate
)]
//! Shared test utilities for `ashpazyar_server`

use anyhow::Result;
use ashpazyar_server::{
    auth::{hash_password, AuthManager},
    config::{Environment, JwtConfig, LogLevel, ServerConfig, VectorClientConfig},
    database::Database,
    llm::LlmProvider,
    models::{Difficulty, NewRecipe, NewUser, Recipe, RecipeIngredientInput, User, UserRole},
    resources::ServerResources,
    server::build_router,
};
use axum::Router;
use std::sync::{Arc, Once};

static INIT_LOGGER: Once = Once::new();

/// Password every test user is created with
pub const TEST_PASSWORD: &str = "correct-horse-42";

/// Initialize quiet logging for tests (call once per test process)
pub fn init_test_logging() {
    INIT_LOGGER.call_once(|| {
        let log_level = match std::env::var("TEST_LOG").as_deref() {
            Ok("TRACE") => tracing::Level::TRACE,
            Ok("DEBUG") => tracing::Level::DEBUG,
            Ok("INFO") => tracing::Level::INFO,
            _ => tracing::Level::WARN,
        };

        let _ = tracing_subscriber::fmt()
            .with_max_level(log_level)
            .with_test_writer()
            .try_init();
    });
}

/// Configuration that never touches the environment
///
/// The vector server URL points at a closed port so semantic search falls
/// back to an empty result immediately.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_owned(),
        http_port: 0,
        database_url: "sqlite::memory:".to_owned(),
        log_level: LogLevel::Warn,
        environment: Environment::Testing,
        jwt: JwtConfig {
            secret: "test-secret-for-integration-tests".to_owned(),
            access_expiry_minutes: 60,
            refresh_expiry_days: 7,
        },
        cors_allowed_origins: vec!["*".to_owned()],
        llm: None,
        vector: VectorClientConfig {
            url: "http://127.0.0.1:9".to_owned(),
            access_token: None,
        },
        page_size: 20,
        max_page_size: 100,
    }
}

/// Standard test resources over a fresh in-memory database
pub async fn create_test_resources() -> Result<Arc<ServerResources>> {
    Ok(Arc::new(build_resources().await?))
}

/// Test resources with a generation backend
pub async fn create_test_resources_with_llm(
    llm: Arc<dyn LlmProvider>,
) -> Result<Arc<ServerResources>> {
    Ok(Arc::new(build_resources().await?.with_llm(llm)))
}

async fn build_resources() -> Result<ServerResources> {
    init_test_logging();
    let config = test_config();
    let database = Database::new(&config.database_url).await?;
    let auth_manager = AuthManager::from_config(&config.jwt);
    Ok(ServerResources::new(database, auth_manager, config)?)
}

/// Full router with every route group and middleware
pub fn test_router(resources: &Arc<ServerResources>) -> Router {
    build_router(resources.clone())
}

/// Create a user with [`TEST_PASSWORD`]
pub async fn create_test_user(database: &Database, username: &str, role: UserRole) -> Result<User> {
    let user = database
        .create_user(&NewUser {
            username: username.to_owned(),
            email: format!("{username}@example.com"),
            password_hash: hash_password(TEST_PASSWORD).await?,
            first_name: "Test".to_owned(),
            last_name: "User".to_owned(),
            student_number: None,
            role,
        })
        .await?;
    Ok(user)
}

/// Create a user and return it with a valid access token
pub async fn create_user_with_token(
    resources: &ServerResources,
    username: &str,
    role: UserRole,
) -> Result<(User, String)> {
    let user = create_test_user(&resources.database, username, role).await?;
    let token = resources.auth_manager.generate_access_token(&user)?;
    Ok((user, token))
}

/// Insert a recipe directly
pub async fn create_test_recipe(
    database: &Database,
    author_id: i64,
    title: &str,
    is_public: bool,
    ingredients: Vec<RecipeIngredientInput>,
) -> Result<Recipe> {
    let recipe = database
        .create_recipe(&NewRecipe {
            title: title.to_owned(),
            description: format!("About {title}"),
            instructions: "Cook it".to_owned(),
            prep_time: 10,
            cook_time: 20,
            servings: 4,
            difficulty: Difficulty::Easy,
            image: None,
            author_id,
            category_id: None,
            is_public,
            tag_ids: Vec::new(),
            dietary_type_ids: Vec::new(),
            ingredients,
        })
        .await?;
    Ok(recipe)
}

/// One ingredient line referencing `ingredient_id`
pub fn ingredient_line(ingredient_id: i64, quantity: &str, order: i64) -> RecipeIngredientInput {
    RecipeIngredientInput {
        ingredient_id,
        quantity: quantity.to_owned(),
        notes: String::new(),
        order,
    }
}
