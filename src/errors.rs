// ABOUTME: Re-exports the shared error types from ashpazyar-core
// ABOUTME: Lets the rest of the crate import errors via crate::errors
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! Unified error handling, defined in `ashpazyar-core` and re-exported here.

pub use ashpazyar_core::errors::*;
