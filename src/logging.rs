// ABOUTME: Logging configuration and structured logging setup for both services
// ABOUTME: Builds the tracing subscriber with noise reduction and exposes AppLogger helpers
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Structured logging configuration

use crate::constants::service_names;
use anyhow::Result;
use serde_json::json;
use std::env;
use std::io;
use tracing::info;
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter,
};

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Output format (json, pretty, compact)
    pub format: LogFormat,
    /// Include source file and line numbers
    pub include_location: bool,
    /// Emit span open/close events
    pub include_spans: bool,
    /// Service name for structured logging
    pub service_name: String,
    /// Service version
    pub service_version: String,
    /// Environment (development, testing, production)
    pub environment: String,
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// `JSON` format for production logging
    Json,
    /// Pretty format for development
    Pretty,
    /// Compact format for space-constrained environments
    Compact,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Pretty,
            include_location: false,
            include_spans: false,
            service_name: service_names::ASHPAZYAR_SERVER.into(),
            service_version: service_names::SERVER_VERSION.to_owned(),
            environment: "development".into(),
        }
    }
}

impl LoggingConfig {
    /// Create logging configuration from environment variables
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_for(service_names::ASHPAZYAR_SERVER)
    }

    /// Same as [`Self::from_env`] with a different default service name
    #[must_use]
    pub fn from_env_for(default_service: &str) -> Self {
        let level = env::var("RUST_LOG")
            .or_else(|_| env::var("LOG_LEVEL"))
            .unwrap_or_else(|_| "info".into());

        let format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("compact") => LogFormat::Compact,
            _ => LogFormat::Pretty,
        };

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());
        let is_production = environment == "production";

        Self {
            level,
            format,
            include_location: is_production || env::var("LOG_INCLUDE_LOCATION").is_ok(),
            include_spans: env::var("LOG_INCLUDE_SPANS").is_ok(),
            service_name: env::var("SERVICE_NAME").unwrap_or_else(|_| default_service.to_owned()),
            service_version: service_names::SERVER_VERSION.to_owned(),
            environment,
        }
    }

    /// Build the filter: base level plus directives that quiet chatty dependencies
    fn env_filter(&self) -> EnvFilter {
        let directives = [
            "hyper=warn".to_owned(),
            "hyper::proto=warn".to_owned(),
            "reqwest=warn".to_owned(),
            "sqlx=info".to_owned(),
            "sqlx::query=warn".to_owned(),
            "tower_http=info".to_owned(),
            format!("{}={}", service_names::LOG_TARGET, crate_level(&self.level)),
        ];

        directives
            .iter()
            .fold(EnvFilter::new(&self.level), |filter, directive| {
                match directive.parse() {
                    Ok(directive) => filter.add_directive(directive),
                    Err(_) => filter,
                }
            })
    }

    /// Initialize the global tracing subscriber
    ///
    /// # Errors
    ///
    /// Returns an error if a global subscriber is already installed
    pub fn init(&self) -> Result<()> {
        let registry = tracing_subscriber::registry().with(self.env_filter());
        let span_events = if self.include_spans {
            FmtSpan::NEW | FmtSpan::CLOSE
        } else {
            FmtSpan::NONE
        };

        match self.format {
            LogFormat::Json => {
                let json_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events)
                    .json();
                registry.with(json_layer).try_init()?;
            }
            LogFormat::Pretty => {
                let pretty_layer = fmt::layer()
                    .with_file(self.include_location)
                    .with_line_number(self.include_location)
                    .with_target(true)
                    .with_writer(io::stdout)
                    .with_span_events(span_events);
                registry.with(pretty_layer).try_init()?;
            }
            LogFormat::Compact => {
                let compact_layer = fmt::layer()
                    .compact()
                    .with_target(false)
                    .with_writer(io::stdout)
                    .with_span_events(FmtSpan::NONE);
                registry.with(compact_layer).try_init()?;
            }
        }

        self.log_startup_info();
        Ok(())
    }

    fn log_startup_info(&self) {
        info!(
            service.name = %self.service_name,
            service.version = %self.service_version,
            environment = %self.environment,
            log.level = %self.level,
            log.format = ?self.format,
            "Service starting up"
        );

        let config_summary = json!({
            "service": {
                "name": self.service_name,
                "version": self.service_version,
                "environment": self.environment
            },
            "logging": {
                "level": self.level,
                "format": format!("{:?}", self.format),
                "location": self.include_location,
                "spans": self.include_spans
            }
        });
        info!("Logging configured: {}", config_summary);
    }
}

/// Level for the crate's own target when `RUST_LOG` is a full directive list
fn crate_level(level: &str) -> &str {
    if level.contains('=') || level.contains(',') {
        "info"
    } else {
        level
    }
}

/// Initialize logging from environment
///
/// # Errors
///
/// Returns an error if logging initialization fails
pub fn init_from_env() -> Result<()> {
    LoggingConfig::from_env().init()
}

/// One `/api/` request as written to the request log
#[derive(Debug, Clone, Copy)]
pub struct ApiRequestRecord<'a> {
    /// HTTP method
    pub method: &'a str,
    /// Request path
    pub path: &'a str,
    /// Raw query string
    pub query: Option<&'a str>,
    /// Username of an authenticated caller
    pub user: Option<&'a str>,
    /// Client address
    pub client_ip: Option<&'a str>,
    /// Redacted body summary
    pub body: Option<&'a str>,
    /// Response status
    pub status: u16,
    /// Handling time
    pub duration_ms: u64,
}

/// Application-specific logging utilities
pub struct AppLogger;

impl AppLogger {
    /// Log login, registration and token refresh outcomes
    pub fn log_auth_event(user: &str, event: &str, success: bool, details: Option<&str>) {
        info!(
            user.name = %user,
            auth.event = %event,
            auth.success = %success,
            auth.details = details.unwrap_or(""),
            "Authentication event"
        );
    }

    /// Log a completed `API` request
    pub fn log_api_request(record: &ApiRequestRecord<'_>) {
        info!(
            http.method = %record.method,
            http.path = %record.path,
            http.query = record.query.unwrap_or(""),
            http.status = %record.status,
            http.duration_ms = %record.duration_ms,
            client.ip = record.client_ip.unwrap_or("unknown"),
            user.name = record.user.unwrap_or("anonymous"),
            http.body = record.body.unwrap_or(""),
            "HTTP request"
        );
    }

    /// Log a recipe generation state change
    pub fn log_generation_event(generation_id: i64, user_id: i64, status: &str, duration_ms: u64) {
        info!(
            generation.id = %generation_id,
            user.id = %user_id,
            generation.status = %status,
            generation.duration_ms = %duration_ms,
            "Recipe generation"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crate_level_falls_back_for_directive_lists() {
        assert_eq!(crate_level("debug"), "debug");
        assert_eq!(crate_level("sqlx=debug,info"), "info");
    }

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.format, LogFormat::Pretty);
        assert_eq!(config.service_name, service_names::ASHPAZYAR_SERVER);
    }
}
