// ABOUTME: HTTP server assembly for the recipe API and the vector search service
// ABOUTME: Merges route groups, applies the middleware stack, and serves with graceful shutdown
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Server
//!
//! [`build_router`] is what the binary serves and what integration tests
//! drive with `tower::ServiceExt::oneshot`. Layers are applied innermost
//! first: body limits and timeout sit closest to the handlers, CORS is the
//! outermost layer so preflight requests never reach authentication.

use crate::constants::http::{MAX_BODY_BYTES, REQUEST_TIMEOUT_SECS};
use crate::middleware::{log_api_requests, request_tracing, setup_cors};
use crate::resources::ServerResources;
use crate::routes::{
    AuthRoutes, BookmarkRoutes, CategoryRoutes, GenerationRoutes, HealthRoutes, HistoryRoutes,
    IngredientRoutes, NutritionRoutes, RecipeRoutes, SharingRoutes,
};
use crate::vector::{VectorRoutes, VectorState};
use anyhow::{Context, Result};
use axum::extract::DefaultBodyLimit;
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::{info, Level};

/// Every route group of the recipe API with the full middleware stack
pub fn build_router(resources: Arc<ServerResources>) -> Router {
    let timeout = Duration::from_secs(REQUEST_TIMEOUT_SECS);

    Router::new()
        .merge(HealthRoutes::routes(resources.clone()))
        .merge(AuthRoutes::routes(resources.clone()))
        .merge(RecipeRoutes::routes(resources.clone()))
        .merge(GenerationRoutes::routes(resources.clone()))
        .merge(IngredientRoutes::routes(resources.clone()))
        .merge(NutritionRoutes::routes(resources.clone()))
        .merge(BookmarkRoutes::routes(resources.clone()))
        .merge(HistoryRoutes::routes(resources.clone()))
        .merge(CategoryRoutes::routes(resources.clone()))
        .merge(SharingRoutes::routes(resources.clone()))
        .layer(TimeoutLayer::new(timeout))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(axum::middleware::from_fn_with_state(
            resources.auth_manager.clone(),
            log_api_requests,
        ))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::DEBUG))
                .on_response(DefaultOnResponse::new().level(Level::DEBUG)),
        )
        .layer(axum::middleware::from_fn(request_tracing))
        .layer(setup_cors(&resources.config))
}

/// Vector search routes with request tracing and body limits
pub fn build_vector_router(state: VectorState) -> Router {
    VectorRoutes::routes(state)
        .layer(TimeoutLayer::new(Duration::from_secs(REQUEST_TIMEOUT_SECS)))
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .layer(RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(axum::middleware::from_fn(request_tracing))
}

/// Bind `host:port` and serve `router` until Ctrl-C or SIGTERM
///
/// # Errors
///
/// Returns an error if the address cannot be bound or the server fails
pub async fn serve(router: Router, host: &str, port: u16) -> Result<()> {
    let addr = format!("{host}:{port}");
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(addr = %addr, "listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("HTTP server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("received Ctrl-C, shutting down"),
        () = terminate => info!("received SIGTERM, shutting down"),
    }
}
