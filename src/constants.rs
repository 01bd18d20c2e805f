// ABOUTME: Application-wide constants and defaults for the recipe API and vector server
// ABOUTME: Groups ports, auth lifetimes, pagination, dataset and vector search limits
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Constants Module
//!
//! Hardcoded defaults. Anything an operator may want to change is read from the
//! environment in [`crate::config`], falling back to the values below.

/// Service identity
pub mod service_names {
    /// Main REST API
    pub const ASHPAZYAR_SERVER: &str = "ashpazyar-server";
    /// Vector search service
    pub const VECTOR_SERVER: &str = "recipe-vector-server";
    /// Crate target used in log directives
    pub const LOG_TARGET: &str = "ashpazyar_server";
    /// Server version from Cargo.toml
    pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");
}

/// Network defaults
pub mod ports {
    /// Main API port
    pub const DEFAULT_HTTP_PORT: u16 = 8000;
    /// Vector server port
    pub const DEFAULT_VECTOR_PORT: u16 = 8324;
    /// Bind address
    pub const DEFAULT_HOST: &str = "0.0.0.0";
}

/// Storage defaults
pub mod database {
    /// Main API database
    pub const DEFAULT_DATABASE_URL: &str = "sqlite:./data/ashpazyar.db";
    /// Vector server database
    pub const DEFAULT_VECTOR_DATABASE_URL: &str = "sqlite:./data/vectors.db";
    /// Pool size for file-backed databases
    pub const MAX_CONNECTIONS: u32 = 10;
}

/// JWT lifetimes and identifiers
pub mod auth {
    /// Access token lifetime in minutes
    pub const ACCESS_TOKEN_EXPIRY_MINUTES: i64 = 60;
    /// Refresh token lifetime in days
    pub const REFRESH_TOKEN_EXPIRY_DAYS: i64 = 7;
    /// `aud` claim for every token we issue
    pub const JWT_AUDIENCE: &str = "ashpazyar-api";
    /// Minimum accepted password length
    pub const MIN_PASSWORD_LENGTH: usize = 8;
    /// bcrypt work factor
    pub const BCRYPT_COST: u32 = 10;
    /// Bytes of randomness in a generated development secret
    pub const GENERATED_SECRET_BYTES: usize = 32;
}

/// Pagination defaults
pub mod pagination {
    /// Items per page when the client does not ask
    pub const DEFAULT_PAGE_SIZE: u32 = 20;
    /// Upper bound on `page_size`
    pub const MAX_PAGE_SIZE: u32 = 100;
}

/// Recipe query limits
pub mod recipes {
    /// Maximum title length
    pub const MAX_TITLE_LENGTH: usize = 200;
    /// Maximum ingredient quantity length
    pub const MAX_QUANTITY_LENGTH: usize = 100;
    /// Number of recipes returned by the similar endpoint
    pub const SIMILAR_LIMIT: i64 = 10;
    /// Default servings
    pub const DEFAULT_SERVINGS: i64 = 4;
}

/// Dataset import heuristics
pub mod dataset {
    /// Description is the first step truncated to this many characters
    pub const DESCRIPTION_MAX_CHARS: usize = 200;
    /// Quantity used when the dataset has no amount for an ingredient
    pub const DEFAULT_QUANTITY: &str = "به میزان لازم";
    /// Username owning imported recipes when no author is given
    pub const SYSTEM_USERNAME: &str = "system";
    /// Email of the auto-created system user
    pub const SYSTEM_EMAIL: &str = "system@ashpazyar.local";
    /// Prep/cook minutes used when no duration is recognised
    pub const DEFAULT_TIMES: (i64, i64) = (15, 30);
    /// Lower bound on derived prep minutes
    pub const MIN_PREP_MINUTES: i64 = 10;
    /// Lower bound on derived cook minutes
    pub const MIN_COOK_MINUTES: i64 = 20;
    /// Records per `/insert` call when pushing to the vector server
    pub const DEFAULT_PUSH_BATCH_SIZE: usize = 2;
}

/// Demo data seeding
pub mod seed {
    /// Accounts created by `ashpazyar-cli seed`
    pub const DEFAULT_USERS: usize = 20;
    /// Recipes created by `ashpazyar-cli seed`
    pub const DEFAULT_RECIPES: usize = 50;
    /// Upper bound on seeded ingredients
    pub const DEFAULT_INGREDIENTS: usize = 100;
    /// Password shared by every demo account
    pub const DEMO_PASSWORD: &str = "password123";
    /// Prefix of demo usernames
    pub const USERNAME_PREFIX: &str = "demo_cook";
    /// Ingredients that receive per-100g nutrition
    pub const NUTRITION_INGREDIENTS: usize = 30;
    /// Upper bound on seeded substitute pairs
    pub const MAX_SUBSTITUTE_PAIRS: usize = 20;
    /// Upper bound on ratings per recipe
    pub const MAX_RATINGS_PER_RECIPE: usize = 15;
    /// Upper bound on bookmark attempts
    pub const MAX_BOOKMARKS: usize = 50;
    /// Upper bound on history entries
    pub const MAX_HISTORY: usize = 100;
}

/// Vector search behaviour
pub mod vector {
    /// Results returned when the client omits `limit`
    pub const DEFAULT_SEARCH_LIMIT: usize = 3;
    /// Candidates fetched per requested result before ingredient filtering
    pub const CANDIDATE_MULTIPLIER: usize = 10;
    /// Documents returned for a blank query
    pub const BLANK_QUERY_LIMIT: i64 = 330;
    /// Calory placeholder for records without one
    pub const UNKNOWN_CALORY: &str = "Unknown";
    /// Default remote vector server
    pub const DEFAULT_SERVER_URL: &str = "http://localhost:8324";
    /// Search client timeout
    pub const CLIENT_TIMEOUT_SECS: u64 = 10;
}

/// LLM provider defaults
pub mod llm {
    /// OpenAI-compatible gateway
    pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
    /// Embedding model
    pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
    /// Chat model used for recipe generation
    pub const DEFAULT_CHAT_MODEL: &str = "openai/gpt-4o-mini";
    /// Request timeout for completions
    pub const REQUEST_TIMEOUT_SECS: u64 = 120;
    /// Connect timeout for every provider call
    pub const CONNECT_TIMEOUT_SECS: u64 = 10;
}

/// HTTP layer limits
pub mod http {
    /// Largest accepted request body
    pub const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;
    /// Per-request timeout
    pub const REQUEST_TIMEOUT_SECS: u64 = 60;
    /// Request id header
    pub const REQUEST_ID_HEADER: &str = "x-request-id";
}
