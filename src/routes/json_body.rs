// ABOUTME: JSON request body extractor that reports bad payloads in the API error envelope
// ABOUTME: Also holds serde helpers for loosely typed numeric fields
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use crate::errors::AppError;
use async_trait::async_trait;
use axum::extract::{rejection::JsonRejection, FromRequest, Request};
use axum::Json;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};

/// Drop-in for [`axum::Json`] whose rejection is a 400 `INVALID_INPUT` [`AppError`]
///
/// axum's own rejection answers 415/422 with a plain-text body, which clients
/// of this API cannot parse as `{error:{code,message}}`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonBody<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for JsonBody<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Self(value)),
            Err(rejection) => Err(rejection_to_error(&rejection)),
        }
    }
}

fn rejection_to_error(rejection: &JsonRejection) -> AppError {
    tracing::debug!(status = %rejection.status(), "Rejected JSON body: {}", rejection.body_text());
    AppError::invalid_input(rejection.body_text())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum IntOrText {
    Int(i64),
    Text(String),
}

/// Deserialize an optional integer that may also arrive as a numeric string
///
/// Use with `#[serde(default, deserialize_with = "lenient_int")]`.
///
/// # Errors
///
/// Returns an error for strings that do not parse as an integer and for
/// any other JSON type
pub fn lenient_int<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<IntOrText>::deserialize(deserializer)? {
        None => Ok(None),
        Some(IntOrText::Int(value)) => Ok(Some(value)),
        Some(IntOrText::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| serde::de::Error::custom(format!("'{text}' is not an integer"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Rated {
        #[serde(default, deserialize_with = "lenient_int")]
        rating: Option<i64>,
    }

    #[test]
    fn test_lenient_int_accepts_numbers_and_numeric_strings() {
        let parse = |body: &str| serde_json::from_str::<Rated>(body).map(|r| r.rating);
        assert_eq!(parse(r#"{"rating": 4}"#).unwrap(), Some(4));
        assert_eq!(parse(r#"{"rating": " 5 "}"#).unwrap(), Some(5));
        assert_eq!(parse(r#"{"rating": null}"#).unwrap(), None);
        assert_eq!(parse("{}").unwrap(), None);
        assert!(parse(r#"{"rating": "five"}"#).is_err());
        assert!(parse(r#"{"rating": [5]}"#).is_err());
    }
}
