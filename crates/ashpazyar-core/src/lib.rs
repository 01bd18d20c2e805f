// ABOUTME: Core types for the Ashpazyar recipe platform
// ABOUTME: Foundation crate with error handling, pagination, and shared domain enums
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![deny(unsafe_code)]

//! # Ashpazyar Core
//!
//! Foundation crate providing shared types for the Ashpazyar recipe server and
//! the vector search service. It changes rarely, which keeps incremental builds
//! of the main crate fast.
//!
//! ## Modules
//!
//! - **errors**: Unified error handling with `AppError`, `ErrorCode`, and HTTP responses
//! - **pagination**: Page-number pagination envelopes (`count`, `next`, `previous`, `results`)
//! - **models**: Enumerations shared by the database layer and the REST API

/// Unified error handling system with standard error codes and HTTP responses
pub mod errors;

/// Page-number pagination for list endpoints
pub mod pagination;

/// Shared domain enumerations (roles, difficulty, skill level, generation status)
pub mod models;
