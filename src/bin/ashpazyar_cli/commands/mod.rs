// ABOUTME: Command modules for ashpazyar-cli
// ABOUTME: User management, dataset import/push, and demo data commands
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

pub mod dataset;
pub mod seed;
pub mod user;
