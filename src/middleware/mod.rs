// ABOUTME: HTTP middleware for authentication, CORS, request tracing and log redaction
// ABOUTME: Shared by every route group of the recipe API

/// Bearer-token authentication and admin guard
pub mod auth;
/// CORS layer configuration
pub mod cors;
/// Redaction and truncation of logged request data
pub mod redaction;
/// Request spans and the API request log
pub mod tracing;

pub use auth::{bearer_token, require_admin, AuthMiddleware, AuthResult};
pub use cors::setup_cors;
pub use self::tracing::{create_request_span, log_api_requests, request_tracing, RequestContext};
