// ABOUTME: Binary entry point for the Ashpazyar recipe REST API
// ABOUTME: Loads configuration, opens the database, and serves every route group
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![recursion_limit = "256"]

//! # Ashpazyar API Server Binary
//!
//! Starts the recipe API with JWT authentication, SQLite storage, and the
//! optional generation worker and vector search client.

use anyhow::Result;
use ashpazyar_server::{
    auth::AuthManager,
    config::ServerConfig,
    database::Database,
    logging,
    resources::ServerResources,
    server::{build_router, serve},
};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "ashpazyar-server")]
#[command(about = "Ashpazyar - recipe sharing REST API")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override database URL
    #[arg(long)]
    database_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(database_url) = args.database_url {
        config.database_url = database_url;
    }
    config.validate()?;

    logging::init_from_env()?;

    info!("Starting Ashpazyar API");
    info!("{}", config.summary());

    let database = Database::new(&config.database_url).await?;
    info!("Database initialized");

    let auth_manager = AuthManager::from_config(&config.jwt);
    let host = config.host.clone();
    let port = config.http_port;

    let resources = Arc::new(ServerResources::new(database, auth_manager, config)?);
    let router = build_router(resources);

    display_available_endpoints(&host, port);

    if let Err(e) = serve(router, &host, port).await {
        error!("Server error: {e:#}");
        return Err(e);
    }

    Ok(())
}

#[allow(clippy::cognitive_complexity)]
fn display_available_endpoints(host: &str, port: u16) {
    info!("=== Available API Endpoints ===");
    info!("   Health:        GET  http://{host}:{port}/health");
    info!("   Register:      POST http://{host}:{port}/api/auth/users/");
    info!("   Login:         POST http://{host}:{port}/api/auth/jwt/create/");
    info!("   Recipes:       GET  http://{host}:{port}/api/recipes/");
    info!("   Generate:      POST http://{host}:{port}/api/recipes/generate/");
    info!("   Semantic:      POST http://{host}:{port}/api/recipes/semantic_search/");
    info!("   Ingredients:   GET  http://{host}:{port}/api/ingredients/");
    info!("   Nutrition:     POST http://{host}:{port}/api/nutrition/calculate/");
    info!("   Bookmarks:     GET  http://{host}:{port}/api/bookmarks/");
    info!("   History:       GET  http://{host}:{port}/api/history/");
    info!("   Shared recipe: GET  http://{host}:{port}/api/share/{{share_id}}/");
    info!("=== End of Endpoint List ===");
}
