// ABOUTME: Centralized resource container shared by every route group
// ABOUTME: Holds the database, token manager, auth middleware, LLM provider and search client
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Server Resources
//!
//! Built once at startup and handed to each `XRoutes::routes` as
//! `Arc<ServerResources>`, so handlers never construct clients or managers
//! themselves.

use crate::auth::AuthManager;
use crate::config::ServerConfig;
use crate::database::Database;
use crate::errors::AppResult;
use crate::llm::{LlmProvider, OpenAiCompatibleProvider};
use crate::middleware::AuthMiddleware;
use crate::search_client::RecipeSearchClient;
use ashpazyar_core::pagination::PageParams;
use std::sync::Arc;
use tracing::info;

/// Centralized resource container for dependency injection
#[derive(Clone)]
pub struct ServerResources {
    /// Recipe database
    pub database: Arc<Database>,
    /// Token issuance and validation
    pub auth_manager: Arc<AuthManager>,
    /// Header-to-user resolution
    pub auth_middleware: Arc<AuthMiddleware>,
    /// Startup configuration
    pub config: Arc<ServerConfig>,
    /// Generation backend; generations stay pending without one
    pub llm: Option<Arc<dyn LlmProvider>>,
    /// Vector server client
    pub search_client: Arc<RecipeSearchClient>,
}

impl ServerResources {
    /// Assemble resources, creating the LLM provider when one is configured
    ///
    /// # Errors
    ///
    /// Returns an error if an HTTP client cannot be created
    pub fn new(database: Database, auth_manager: AuthManager, config: ServerConfig) -> AppResult<Self> {
        let llm: Option<Arc<dyn LlmProvider>> = match &config.llm {
            Some(llm_config) => {
                let provider = OpenAiCompatibleProvider::new(llm_config.clone())?;
                info!(model = %llm_config.model, "Recipe generation enabled");
                Some(Arc::new(provider))
            }
            None => {
                info!("No LLM configured; generation requests will stay pending");
                None
            }
        };
        let search_client = RecipeSearchClient::new(&config.vector)?;

        let database = Arc::new(database);
        let auth_manager = Arc::new(auth_manager);
        let auth_middleware = Arc::new(AuthMiddleware::new(auth_manager.clone(), database.clone()));

        Ok(Self {
            database,
            auth_manager,
            auth_middleware,
            config: Arc::new(config),
            llm,
            search_client: Arc::new(search_client),
        })
    }

    /// Replace the generation backend
    #[must_use]
    pub fn with_llm(mut self, llm: Arc<dyn LlmProvider>) -> Self {
        self.llm = Some(llm);
        self
    }

    /// Pagination parameters with the configured default and maximum page size
    #[must_use]
    pub fn page_params(&self, page: Option<u32>, page_size: Option<u32>) -> PageParams {
        PageParams::new(page, page_size, self.config.page_size, self.config.max_page_size)
    }
}
