// ABOUTME: Request tracing middleware: per-request span with a correlation id
// ABOUTME: Also writes the /api/ request log with caller, client IP, status and timing
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use super::auth::bearer_token;
use super::redaction::{redact_headers, summarize_body};
use crate::auth::AuthManager;
use crate::constants::http::{MAX_BODY_BYTES, REQUEST_ID_HEADER};
use crate::logging::{ApiRequestRecord, AppLogger};
use axum::{
    body::Body,
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::{field::Empty, info_span, Instrument, Span};
use uuid::Uuid;

/// Request context carried in request extensions
#[derive(Debug, Clone)]
pub struct RequestContext {
    /// Correlation id, echoed in the `x-request-id` response header
    pub request_id: String,
}

impl RequestContext {
    /// Context with the caller's `x-request-id`, or a fresh `req_<uuid>` id
    #[must_use]
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let request_id = headers
            .get(REQUEST_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map_or_else(|| format!("req_{}", Uuid::new_v4().simple()), str::to_owned);
        Self { request_id }
    }
}

/// Span for one HTTP request; status and timing are recorded on completion
#[must_use]
pub fn create_request_span(method: &Method, path: &str, request_id: &str) -> Span {
    info_span!(
        "http_request",
        method = %method,
        path = %path,
        request_id = %request_id,
        status_code = Empty,
        duration_ms = Empty,
    )
}

/// Wrap every request in a span and echo its correlation id
pub async fn request_tracing(mut request: Request, next: Next) -> Response {
    let context = RequestContext::from_headers(request.headers());
    let span = create_request_span(request.method(), request.uri().path(), &context.request_id);
    let request_id = context.request_id.clone();
    request.extensions_mut().insert(context);

    let started = Instant::now();
    let mut response = next.run(request).instrument(span.clone()).await;

    span.record("status_code", response.status().as_u16());
    span.record("duration_ms", elapsed_ms(started));
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

/// Client address: first `X-Forwarded-For` entry, then `X-Real-IP`, then the peer
#[must_use]
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> Option<String> {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|value| !value.is_empty())
    };

    header("x-forwarded-for")
        .and_then(|list| list.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty())
        .or_else(|| header("x-real-ip"))
        .map(str::to_owned)
        .or_else(|| peer.map(|addr| addr.ip().to_string()))
}

/// Log `/api/` requests with caller, client address, body summary and timing
///
/// Request bodies of writes are buffered so they can be summarised, then
/// handed on unchanged.
pub async fn log_api_requests(
    State(auth_manager): State<Arc<AuthManager>>,
    request: Request,
    next: Next,
) -> Response {
    let path = request.uri().path().to_owned();
    if !path.starts_with("/api/") {
        return next.run(request).await;
    }

    let started = Instant::now();
    let method = request.method().clone();
    let query = request.uri().query().map(str::to_owned);
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let ip = client_ip(request.headers(), peer);
    let user = bearer_token(request.headers())
        .and_then(|token| auth_manager.validate_access_token(token).ok())
        .map(|claims| claims.username);

    tracing::debug!(
        headers = ?redact_headers(
            request
                .headers()
                .iter()
                .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        ),
        "API request headers"
    );

    let (request, body) = if matches!(method, Method::POST | Method::PUT | Method::PATCH) {
        let (parts, body) = request.into_parts();
        let Ok(bytes) = axum::body::to_bytes(body, MAX_BODY_BYTES).await else {
            return (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response();
        };
        let summary = summarize_body(&bytes);
        (Request::from_parts(parts, Body::from(bytes)), summary)
    } else {
        (request, None)
    };

    let response = next.run(request).await;

    AppLogger::log_api_request(&ApiRequestRecord {
        method: method.as_str(),
        path: &path,
        query: query.as_deref(),
        user: user.as_deref(),
        client_ip: ip.as_deref(),
        body: body.as_deref(),
        status: response.status().as_u16(),
        duration_ms: elapsed_ms(started),
    });
    response
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_id_is_honoured_or_generated() {
        let mut headers = HeaderMap::new();
        let generated = RequestContext::from_headers(&headers);
        assert!(generated.request_id.starts_with("req_"));
        assert_eq!(generated.request_id.len(), 4 + 32);

        headers.insert(REQUEST_ID_HEADER, HeaderValue::from_static("abc-123"));
        assert_eq!(RequestContext::from_headers(&headers).request_id, "abc-123");
    }

    #[test]
    fn test_client_ip_precedence() {
        let peer: SocketAddr = "10.0.0.9:5000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("10.0.0.9"));

        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.4"));
        assert_eq!(client_ip(&headers, Some(peer)).as_deref(), Some("192.168.1.4"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, None).as_deref(), Some("203.0.113.7"));
    }
}
