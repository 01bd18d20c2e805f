// ABOUTME: System prompts for LLM interactions loaded at compile time
// ABOUTME: Provides the recipe generation prompt that fixes the JSON answer shape
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # System Prompts
//!
//! Prompts live in markdown files next to this module and are embedded with
//! `include_str!`.

/// Recipe generation system prompt
///
/// Describes the JSON object the generation worker parses into a recipe.
pub const RECIPE_GENERATION_PROMPT: &str = include_str!("recipe_generation.md");

/// Get the system prompt for recipe generation
#[must_use]
pub const fn recipe_generation_prompt() -> &'static str {
    RECIPE_GENERATION_PROMPT
}
