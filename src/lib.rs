// ABOUTME: Main library entry point for the Ashpazyar recipe platform
// ABOUTME: REST API, AI generation worker, vector search service, and dataset importer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![recursion_limit = "256"]
#![deny(unsafe_code)]

//! # Ashpazyar Server
//!
//! Backend for a recipe-sharing application: accounts with JWT
//! authentication, recipes with filtering and pagination, ratings,
//! bookmarks, history, share links, nutrition totals, and a proxy that turns
//! prompts into recipes through an OpenAI-compatible model.
//!
//! A second service, the recipe vector server, stores embedded dataset
//! records and answers semantic searches with an ingredient filter. The main
//! API reaches it through [`search_client::RecipeSearchClient`].
//!
//! ## Architecture
//!
//! - **Routes**: one `XRoutes` per domain, merged in [`server::build_router`]
//! - **Database**: [`database::Database`] over sqlx/SQLite, one file per entity group
//! - **Resources**: [`resources::ServerResources`] shared by every handler
//! - **Vector**: document store, cosine ranking, and the `/insert` `/search` surface
//! - **Importer**: JSONL dataset ingestion used by `ashpazyar-cli`
//! - **Seed**: randomised demo data for local development
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use ashpazyar_server::config::ServerConfig;
//!
//! fn main() -> anyhow::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     println!("Ashpazyar configured on port {}", config.http_port);
//!     Ok(())
//! }
//! ```

// ── Public API ──────────────────────────────────────────────────────────
// Used by the binaries in src/bin/ and by integration tests in tests/.

/// JWT issuance, validation, and password hashing
pub mod auth;

/// Environment configuration
pub mod config;

/// Application constants and defaults
pub mod constants;

/// SQLite persistence
pub mod database;

/// Error types shared with `ashpazyar-core`
pub mod errors;

/// Background AI recipe generation
pub mod generation;

/// JSONL dataset importer
pub mod importer;

/// Chat and embedding providers
pub mod llm;

/// Logging setup and structured log helpers
pub mod logging;

/// HTTP middleware
pub mod middleware;

/// Domain models
pub mod models;

/// Shared server resources
pub mod resources;

/// REST route groups
pub mod routes;

/// Vector server client
pub mod search_client;

/// Demo data generator
pub mod seed;

/// Router assembly and serving
pub mod server;

/// Vector search service
pub mod vector;
