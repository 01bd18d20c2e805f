// ABOUTME: Binary entry point for the recipe vector search service
// ABOUTME: Embeds dataset records and answers semantic searches over them
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Recipe Vector Server Binary
//!
//! Serves `/insert`, `/search` and `/health` on `VECTOR_PORT`. Every call
//! except `/health` needs `Authorization: Bearer $VECTOR_ACCESS_TOKEN`.

use anyhow::Result;
use ashpazyar_server::{
    config::VectorServerConfig,
    constants::service_names,
    llm::OpenAiEmbeddings,
    logging::LoggingConfig,
    server::{build_vector_router, serve},
    vector::{VectorState, VectorStore},
};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "recipe-vector-server")]
#[command(about = "Semantic recipe search over embedded dataset records")]
pub struct Args {
    /// Override listening port
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = VectorServerConfig::from_env()?;
    if let Some(port) = args.port {
        config.port = port;
    }

    LoggingConfig::from_env_for(service_names::VECTOR_SERVER).init()?;

    info!("Starting recipe vector server");
    info!("{}", config.summary());

    let store = VectorStore::new(&config.database_url).await?;
    let embedder = OpenAiEmbeddings::new(config.embedding.clone())?;

    let state = VectorState {
        store,
        embedder: Arc::new(embedder),
        access_token: Arc::from(config.access_token.as_str()),
    };

    if let Err(e) = serve(build_vector_router(state), &config.host, config.port).await {
        error!("Vector server error: {e:#}");
        return Err(e);
    }

    Ok(())
}
