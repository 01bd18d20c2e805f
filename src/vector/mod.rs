// ABOUTME: Vector recipe search: documents, cosine ranking, SQLite store, HTTP routes
// ABOUTME: Powers the standalone recipe-vector-server binary
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Vector Search
//!
//! Dataset records are turned into [`VectorDocument`]s, embedded through an
//! [`crate::llm::EmbeddingProvider`], and stored in their own SQLite file.
//! Search embeds the query and scans every stored embedding.

mod document;
mod routes;
pub mod similarity;
mod store;

pub use document::{
    DocumentMetadata, InsertRequest, RecipeInput, SearchHit, SearchRequest, VectorDocument,
};
pub use routes::{search, VectorRoutes, VectorState};
pub use store::VectorStore;
