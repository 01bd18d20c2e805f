// ABOUTME: Configuration module for the recipe API and vector search server
// ABOUTME: Re-exports environment-driven config types
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Configuration is read once from environment variables at startup.
//!
//! - [`ServerConfig`]: main REST API
//! - [`VectorServerConfig`]: vector search service

/// Environment variable parsing and typed configuration structs
pub mod environment;

pub use environment::{
    EmbeddingConfig, Environment, JwtConfig, LlmConfig, LogLevel, ServerConfig,
    VectorClientConfig, VectorServerConfig,
};
