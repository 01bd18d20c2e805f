// ABOUTME: Tests for environment-driven configuration of both servers
// ABOUTME: Env-mutating tests run serially and restore the variables they touch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;

use ashpazyar_server::config::{Environment, LogLevel, ServerConfig, VectorServerConfig};
use serial_test::serial;
use std::env;

const MANAGED_VARS: &[&str] = &[
    "ENVIRONMENT",
    "JWT_SECRET",
    "HTTP_PORT",
    "DATABASE_URL",
    "LOG_LEVEL",
    "CORS_ALLOWED_ORIGINS",
    "LLM_API_KEY",
    "LLM_BASE_URL",
    "LLM_MODEL",
    "VECTOR_SERVER_URL",
    "VECTOR_ACCESS_TOKEN",
    "VECTOR_PORT",
    "VECTOR_DATABASE_URL",
    "PAGE_SIZE",
    "MAX_PAGE_SIZE",
    "JWT_ACCESS_EXPIRY_MINUTES",
    "JWT_REFRESH_EXPIRY_DAYS",
];

/// Clears every managed variable and restores the previous values on drop
struct EnvGuard {
    saved: Vec<(&'static str, Option<String>)>,
}

impl EnvGuard {
    fn clean() -> Self {
        let saved = MANAGED_VARS
            .iter()
            .map(|key| (*key, env::var(key).ok()))
            .collect();
        for key in MANAGED_VARS {
            env::remove_var(key);
        }
        Self { saved }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, value) in &self.saved {
            match value {
                Some(value) => env::set_var(key, value),
                None => env::remove_var(key),
            }
        }
    }
}

#[test]
fn test_log_level_parsing() {
    assert_eq!(LogLevel::from_str_or_default("error"), LogLevel::Error);
    assert_eq!(LogLevel::from_str_or_default("WARN"), LogLevel::Warn);
    assert_eq!(LogLevel::from_str_or_default("Debug"), LogLevel::Debug);
    assert_eq!(LogLevel::from_str_or_default("trace"), LogLevel::Trace);
    assert_eq!(LogLevel::from_str_or_default("loud"), LogLevel::Info);
}

#[test]
fn test_environment_parsing() {
    assert_eq!(Environment::from_str_or_default("PROD"), Environment::Production);
    assert_eq!(Environment::from_str_or_default("test"), Environment::Testing);
    assert_eq!(Environment::from_str_or_default("staging"), Environment::Development);
}

#[test]
#[serial]
fn test_server_config_defaults() {
    let _guard = EnvGuard::clean();

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 8000);
    assert_eq!(config.environment, Environment::Development);
    assert_eq!(config.log_level, LogLevel::Info);
    assert_eq!(config.cors_allowed_origins, vec!["*".to_owned()]);
    assert_eq!(config.page_size, 20);
    assert_eq!(config.max_page_size, 100);
    assert_eq!(config.vector.url, "http://localhost:8324");
    assert!(config.vector.access_token.is_none());
    assert!(config.llm.is_none());
    // A random secret is generated outside production
    assert!(!config.jwt.secret.is_empty());
}

#[test]
#[serial]
fn test_server_config_reads_overrides() {
    let _guard = EnvGuard::clean();
    env::set_var("HTTP_PORT", "9100");
    env::set_var("LOG_LEVEL", "debug");
    env::set_var("JWT_SECRET", "s3cret");
    env::set_var("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example,");
    env::set_var("LLM_API_KEY", "sk-test");
    env::set_var("LLM_MODEL", "tiny-chef");
    env::set_var("VECTOR_ACCESS_TOKEN", "vector-token");
    env::set_var("PAGE_SIZE", "50");

    let config = ServerConfig::from_env().unwrap();
    assert_eq!(config.http_port, 9100);
    assert_eq!(config.log_level, LogLevel::Debug);
    assert_eq!(config.jwt.secret, "s3cret");
    assert_eq!(
        config.cors_allowed_origins,
        vec!["https://a.example".to_owned(), "https://b.example".to_owned()]
    );
    let llm = config.llm.as_ref().unwrap();
    assert_eq!(llm.model, "tiny-chef");
    assert_eq!(llm.api_key.as_deref(), Some("sk-test"));
    assert_eq!(config.vector.access_token.as_deref(), Some("vector-token"));
    assert_eq!(config.page_size, 50);

    let summary = config.summary();
    assert!(summary.contains("Enabled (tiny-chef)"));
    assert!(!summary.contains("s3cret"));
    assert!(!summary.contains("vector-token"));
}

#[test]
#[serial]
fn test_server_config_rejects_bad_values() {
    let _guard = EnvGuard::clean();

    env::set_var("HTTP_PORT", "not-a-port");
    assert!(ServerConfig::from_env().is_err());
    env::remove_var("HTTP_PORT");

    env::set_var("PAGE_SIZE", "500");
    assert!(ServerConfig::from_env().is_err());
    env::remove_var("PAGE_SIZE");

    env::set_var("JWT_ACCESS_EXPIRY_MINUTES", "0");
    assert!(ServerConfig::from_env().is_err());
    env::remove_var("JWT_ACCESS_EXPIRY_MINUTES");

    env::set_var("ENVIRONMENT", "production");
    assert!(ServerConfig::from_env().is_err());
    env::set_var("JWT_SECRET", "prod-secret");
    assert!(ServerConfig::from_env().is_ok());
}

#[test]
fn test_validate_page_bounds() {
    let mut config = common::test_config();
    assert!(config.validate().is_ok());

    config.page_size = 0;
    assert!(config.validate().is_err());

    config.page_size = 101;
    assert!(config.validate().is_err());
}

#[test]
#[serial]
fn test_vector_server_config_requires_token() {
    let _guard = EnvGuard::clean();
    assert!(VectorServerConfig::from_env().is_err());

    env::set_var("VECTOR_ACCESS_TOKEN", "   ");
    assert!(VectorServerConfig::from_env().is_err());

    env::set_var("VECTOR_ACCESS_TOKEN", "vector-token");
    env::set_var("VECTOR_PORT", "9200");
    let config = VectorServerConfig::from_env().unwrap();
    assert_eq!(config.port, 9200);
    assert_eq!(config.access_token, "vector-token");
    assert_eq!(config.database_url, "sqlite:./data/vectors.db");
    assert!(!config.summary().contains("vector-token"));
}
