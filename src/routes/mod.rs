// ABOUTME: Route module organization for the recipe API HTTP endpoints
// ABOUTME: One module per domain plus the pagination and query-string helpers they share
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Route module for the recipe API
//!
//! Each domain module exposes an `XRoutes::routes(resources)` constructor
//! returning an axum `Router` with its state applied, and keeps handlers thin:
//! authenticate, validate the payload, call [`crate::database::Database`].

/// Registration, tokens, account and profile routes
pub mod auth;
/// Bookmark routes
pub mod bookmarks;
/// Category, tag and dietary type routes
pub mod categories;
/// AI recipe generation status and result routes
pub mod generation;
/// Health check routes
pub mod health;
/// Recently viewed recipe routes
pub mod history;
/// Ingredient and substitute routes
pub mod ingredients;
/// JSON body extractor with enveloped rejections
pub mod json_body;
/// Nutrition calculation routes
pub mod nutrition;
/// Recipe CRUD, rating, sharing, discovery routes
pub mod recipes;
/// Public share link routes
pub mod sharing;

/// Authentication route handlers
pub use auth::AuthRoutes;
/// Authentication service
pub use auth::AuthService;
/// Bookmark route handlers
pub use bookmarks::BookmarkRoutes;
/// Catalog route handlers
pub use categories::CategoryRoutes;
/// Generation route handlers
pub use generation::GenerationRoutes;
/// Health check route handlers
pub use health::HealthRoutes;
/// History route handlers
pub use history::HistoryRoutes;
/// Ingredient route handlers
pub use ingredients::IngredientRoutes;
/// JSON body extractor
pub use json_body::{lenient_int, JsonBody};
/// Nutrition route handlers
pub use nutrition::NutritionRoutes;
/// Recipe route handlers
pub use recipes::RecipeRoutes;
/// Share link route handlers
pub use sharing::SharingRoutes;

use crate::errors::{AppError, AppResult};
use ashpazyar_core::pagination::{Page, PageParams};
use axum::http::Uri;
use serde::Deserialize;

/// `page` / `page_size` query parameters
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PaginationQuery {
    /// 1-based page number
    pub page: Option<u32>,
    /// Items per page
    pub page_size: Option<u32>,
}

/// Wrap one page of results with `next` / `previous` links built from `uri`
///
/// # Errors
///
/// Returns `RESOURCE_NOT_FOUND` when a page past the last one is requested
pub fn paginate<T>(uri: &Uri, params: PageParams, results: Vec<T>, count: i64) -> AppResult<Page<T>> {
    if params.page > 1 && params.offset() >= count {
        return Err(AppError::not_found(format!("Page {}", params.page)));
    }
    Ok(Page::new(results, count, params, |page| page_link(uri, page)))
}

/// Same path and query with `page` replaced; page 1 drops the parameter
#[must_use]
pub fn page_link(uri: &Uri, page: u32) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (key, value) in query_pairs(uri) {
        if key != "page" {
            serializer.append_pair(&key, &value);
        }
    }
    if page > 1 {
        serializer.append_pair("page", &page.to_string());
    }
    let query = serializer.finish();

    if query.is_empty() {
        uri.path().to_owned()
    } else {
        format!("{}?{query}", uri.path())
    }
}

/// Decoded query string pairs in order, keeping repeated keys
#[must_use]
pub fn query_pairs(uri: &Uri) -> Vec<(String, String)> {
    uri.query()
        .map(|query| {
            url::form_urlencoded::parse(query.as_bytes())
                .map(|(key, value)| (key.into_owned(), value.into_owned()))
                .collect()
        })
        .unwrap_or_default()
}

/// Every id given for `key`, as repeated parameters or comma lists
///
/// # Errors
///
/// Returns `INVALID_INPUT` when a value is not an integer
pub fn id_list(pairs: &[(String, String)], key: &str) -> AppResult<Vec<i64>> {
    let mut ids = Vec::new();
    for (_, value) in pairs.iter().filter(|(k, _)| k == key) {
        for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let id = part
                .parse()
                .map_err(|_| AppError::invalid_input(format!("{key}: '{part}' is not a valid id")))?;
            ids.push(id);
        }
    }
    Ok(ids)
}

/// Last non-blank value given for `key`
#[must_use]
pub fn query_value<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, v)| k == key && !v.trim().is_empty())
        .map(|(_, v)| v.trim())
}

/// Integer value for `key`
///
/// # Errors
///
/// Returns `INVALID_INPUT` when the value is not an integer
pub fn query_id(pairs: &[(String, String)], key: &str) -> AppResult<Option<i64>> {
    query_value(pairs, key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| AppError::invalid_input(format!("{key}: '{value}' is not a valid id")))
        })
        .transpose()
}

/// Deserialize a field where an explicit `null` differs from an absent key
///
/// Use with `#[serde(default, deserialize_with = "double_option")]`:
/// absent gives `None`, `null` gives `Some(None)`.
///
/// # Errors
///
/// Returns the inner deserializer's error
pub fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
