// ABOUTME: SQLite database manager for the recipe API
// ABOUTME: Owns the sqlx pool, runs schema migrations, and hosts per-domain query modules
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Database Management
//!
//! One [`Database`] handle wraps the sqlx pool. Each domain adds its own
//! `impl Database` block in a sibling module, together with the
//! `CREATE TABLE` statements it depends on.

mod bookmarks;
mod categories;
mod generations;
mod history;
mod ingredients;
mod nutrition;
mod ratings;
mod recipes;
mod sharing;
mod users;

use crate::constants::database::MAX_CONNECTIONS;
use crate::errors::{AppError, AppResult};
use sqlx::sqlite::{SqliteArguments, SqlitePoolOptions};
use sqlx::{query::Query, Pool, Sqlite};
use std::path::Path;
use tracing::{debug, info};

/// Database manager for all recipe platform data
#[derive(Clone)]
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    /// Connect, creating the SQLite file and its directory if needed, then migrate
    ///
    /// # Errors
    ///
    /// Returns an error if the connection or a migration fails
    pub async fn new(database_url: &str) -> AppResult<Self> {
        let pool = connect_sqlite(database_url).await?;
        let db = Self { pool };
        db.migrate().await?;
        info!(in_memory = database_url.contains(":memory:"), "Database ready");
        Ok(db)
    }

    /// Get a reference to the database pool for advanced operations
    #[must_use]
    pub const fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Run database migrations
    ///
    /// # Errors
    ///
    /// Returns an error if any `CREATE TABLE` statement fails
    pub async fn migrate(&self) -> AppResult<()> {
        self.migrate_users().await?;
        self.migrate_categories().await?;
        self.migrate_ingredients().await?;
        self.migrate_recipes().await?;
        self.migrate_ratings().await?;
        self.migrate_nutrition().await?;
        self.migrate_bookmarks().await?;
        self.migrate_history().await?;
        self.migrate_sharing().await?;
        self.migrate_generations().await?;
        debug!("Database migrations complete");
        Ok(())
    }

    async fn execute_ddl(&self, statement: &str) -> AppResult<()> {
        sqlx::query(statement)
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Migration failed: {e}")))?;
        Ok(())
    }

    /// Ids from `ids` that have no row in `table`
    ///
    /// `table` must be one of the crate's own table names.
    async fn missing_ids(&self, table: &'static str, ids: &[i64]) -> AppResult<Vec<i64>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT id FROM {table} WHERE id IN ({})",
            placeholders(ids.len())
        );
        let found: Vec<i64> = bind_ids(sqlx::query_scalar(&query), ids)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::database(format!("Failed to look up {table}: {e}")))?;

        let mut missing: Vec<i64> = ids.iter().copied().filter(|id| !found.contains(id)).collect();
        missing.sort_unstable();
        missing.dedup();
        Ok(missing)
    }

    /// Fail with `INVALID_INPUT` unless every id in `ids` exists in `table`
    async fn require_ids(&self, table: &'static str, label: &str, ids: &[i64]) -> AppResult<()> {
        let missing = self.missing_ids(table, ids).await?;
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AppError::invalid_input(format!(
                "Invalid {label} id(s): {missing:?}"
            )))
        }
    }
}

/// Values bound to dynamically assembled queries
#[derive(Debug, Clone)]
pub(crate) enum BindValue {
    Int(i64),
    Text(String),
}

/// Bind every value in order
pub(crate) fn bind_all<'q>(
    mut query: Query<'q, Sqlite, SqliteArguments<'q>>,
    values: &'q [BindValue],
) -> Query<'q, Sqlite, SqliteArguments<'q>> {
    for value in values {
        query = match value {
            BindValue::Int(v) => query.bind(*v),
            BindValue::Text(v) => query.bind(v.as_str()),
        };
    }
    query
}

/// Bind ids to a scalar query
pub(crate) fn bind_ids<'q, O>(
    mut query: sqlx::query::QueryScalar<'q, Sqlite, O, SqliteArguments<'q>>,
    ids: &'q [i64],
) -> sqlx::query::QueryScalar<'q, Sqlite, O, SqliteArguments<'q>> {
    for id in ids {
        query = query.bind(*id);
    }
    query
}

/// `?, ?, ?` with `n` placeholders
pub(crate) fn placeholders(n: usize) -> String {
    vec!["?"; n].join(", ")
}

/// Open a SQLite pool, creating the file and its directory if needed
///
/// # Errors
///
/// Returns an error if the directory cannot be created or the connection fails
pub(crate) async fn connect_sqlite(database_url: &str) -> AppResult<Pool<Sqlite>> {
    if database_url.contains(":memory:") {
        // Every connection to :memory: is a separate database
        return SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect(database_url)
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")));
    }

    ensure_parent_dir(database_url).await?;
    let connection_options = if database_url.starts_with("sqlite:") && !database_url.contains('?') {
        format!("{database_url}?mode=rwc")
    } else {
        database_url.to_owned()
    };
    SqlitePoolOptions::new()
        .max_connections(MAX_CONNECTIONS)
        .connect(&connection_options)
        .await
        .map_err(|e| AppError::database(format!("Failed to connect to {database_url}: {e}")))
}

async fn ensure_parent_dir(database_url: &str) -> AppResult<()> {
    let path = database_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("sqlite:");
    let path = path.split('?').next().unwrap_or(path);
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                AppError::database(format!(
                    "Failed to create database directory {}: {e}",
                    parent.display()
                ))
            })?;
        }
    }
    Ok(())
}
