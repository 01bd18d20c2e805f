// ABOUTME: Background worker that turns a generation prompt into a private recipe
// ABOUTME: Drives pending -> processing -> completed|failed and parses the model's JSON answer
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

//! # Recipe Generation
//!
//! `POST /api/recipes/generate/` stores a `pending` record and hands it to
//! [`GenerationWorker::spawn`]. The worker asks the configured
//! [`LlmProvider`] for a JSON recipe, resolves ingredient names against the
//! catalog (creating missing ones), and stores the result as a private recipe
//! owned by the requester.

use crate::constants::recipes::{DEFAULT_SERVINGS, MAX_QUANTITY_LENGTH, MAX_TITLE_LENGTH};
use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::llm::prompts::recipe_generation_prompt;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider};
use crate::logging::AppLogger;
use crate::models::{Difficulty, GenerationStatus, NewRecipe, RecipeGeneration, RecipeIngredientInput};
use serde::Deserialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Instant;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

const GENERATION_TEMPERATURE: f32 = 0.7;
const GENERATION_MAX_TOKENS: u32 = 2048;

/// Instructions arrive either as one text block or a list of steps
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Instructions {
    Text(String),
    Steps(Vec<String>),
}

impl Default for Instructions {
    fn default() -> Self {
        Self::Text(String::new())
    }
}

impl Instructions {
    fn into_text(self) -> String {
        match self {
            Self::Text(text) => text.trim().to_owned(),
            Self::Steps(steps) => steps
                .iter()
                .map(|step| step.trim())
                .filter(|step| !step.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }
}

/// One ingredient line of a model answer
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedIngredient {
    /// Ingredient name, matched against the catalog
    pub name: String,
    /// Free-text amount
    #[serde(default)]
    pub quantity: String,
    /// Preparation notes
    #[serde(default)]
    pub notes: String,
}

/// Recipe as returned by the model
#[derive(Debug, Clone, Deserialize)]
pub struct GeneratedRecipe {
    /// Title
    pub title: String,
    /// Short description
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    instructions: Instructions,
    /// Preparation minutes
    #[serde(default)]
    pub prep_time: Option<i64>,
    /// Cooking minutes
    #[serde(default)]
    pub cook_time: Option<i64>,
    /// Portions
    #[serde(default)]
    pub servings: Option<i64>,
    /// `easy`, `medium` or `hard`
    #[serde(default)]
    pub difficulty: Option<String>,
    /// Ingredient lines
    #[serde(default)]
    pub ingredients: Vec<GeneratedIngredient>,
}

impl GeneratedRecipe {
    /// Parse a model answer, tolerating a surrounding markdown code fence
    ///
    /// # Errors
    ///
    /// Returns `EXTERNAL_SERVICE_ERROR` when the answer is not a recipe object
    /// or has no title or instructions
    pub fn parse(content: &str) -> AppResult<Self> {
        let body = strip_code_fence(content);
        let recipe: Self = serde_json::from_str(body).map_err(|e| {
            AppError::external_service("LLM", format!("Model answer is not a recipe object: {e}"))
        })?;
        if recipe.title.trim().is_empty() {
            return Err(AppError::external_service("LLM", "Model answer has no title"));
        }
        if recipe.instructions_text().is_empty() {
            return Err(AppError::external_service("LLM", "Model answer has no instructions"));
        }
        Ok(recipe)
    }

    /// Instructions as newline-separated text
    #[must_use]
    pub fn instructions_text(&self) -> String {
        self.instructions.clone().into_text()
    }

    /// Private recipe owned by `author_id` with the resolved ingredient lines
    #[must_use]
    pub fn into_new_recipe(self, author_id: i64, ingredients: Vec<RecipeIngredientInput>) -> NewRecipe {
        let instructions = self.instructions_text();
        NewRecipe {
            title: self.title.trim().chars().take(MAX_TITLE_LENGTH).collect(),
            description: self.description.trim().to_owned(),
            instructions,
            prep_time: self.prep_time.unwrap_or(0).max(0),
            cook_time: self.cook_time.unwrap_or(0).max(0),
            servings: self.servings.filter(|s| *s >= 1).unwrap_or(DEFAULT_SERVINGS),
            difficulty: self
                .difficulty
                .as_deref()
                .and_then(Difficulty::parse)
                .unwrap_or_default(),
            image: None,
            author_id,
            category_id: None,
            is_public: false,
            tag_ids: Vec::new(),
            dietary_type_ids: Vec::new(),
            ingredients,
        }
    }
}

fn strip_code_fence(content: &str) -> &str {
    let trimmed = content.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.trim_start_matches(|c: char| c.is_ascii_alphabetic());
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

/// Runs generations against one LLM provider
#[derive(Clone)]
pub struct GenerationWorker {
    database: Arc<Database>,
    llm: Arc<dyn LlmProvider>,
}

impl GenerationWorker {
    /// Create a worker
    #[must_use]
    pub fn new(database: Arc<Database>, llm: Arc<dyn LlmProvider>) -> Self {
        Self { database, llm }
    }

    /// Process `generation` on a background task
    pub fn spawn(self, generation: RecipeGeneration) -> JoinHandle<GenerationStatus> {
        tokio::spawn(async move { self.process(&generation).await })
    }

    /// Move `generation` through processing to a terminal status
    pub async fn process(&self, generation: &RecipeGeneration) -> GenerationStatus {
        let started = Instant::now();
        info!(
            generation_id = generation.id,
            provider = self.llm.name(),
            "Starting recipe generation"
        );

        if let Err(e) = self.database.mark_generation_processing(generation.id).await {
            error!(generation_id = generation.id, error = %e, "Failed to mark generation processing");
            return GenerationStatus::Pending;
        }

        let status = match self.generate(generation).await {
            Ok(recipe_id) => {
                info!(generation_id = generation.id, recipe_id, "Generated recipe stored");
                GenerationStatus::Completed
            }
            Err(e) => {
                warn!(generation_id = generation.id, error = %e, "Recipe generation failed");
                self.record_failure(generation.id, &e).await
            }
        };

        let duration_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
        AppLogger::log_generation_event(generation.id, generation.user_id, status.as_str(), duration_ms);
        status
    }

    async fn record_failure(&self, generation_id: i64, cause: &AppError) -> GenerationStatus {
        if let Err(e) = self.database.fail_generation(generation_id, &cause.message).await {
            error!(generation_id, error = %e, "Failed to record generation failure");
        }
        GenerationStatus::Failed
    }

    async fn generate(&self, generation: &RecipeGeneration) -> AppResult<i64> {
        let request = ChatRequest::new(vec![
            ChatMessage::system(recipe_generation_prompt()),
            ChatMessage::user(generation.prompt.clone()),
        ])
        .with_temperature(GENERATION_TEMPERATURE)
        .with_max_tokens(GENERATION_MAX_TOKENS)
        .with_json_mode();

        let response = self.llm.complete(&request).await?;
        let generated = GeneratedRecipe::parse(&response.content)?;

        let mut seen = HashSet::new();
        let mut ingredients = Vec::with_capacity(generated.ingredients.len());
        for item in &generated.ingredients {
            let name = item.name.trim();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                continue;
            }
            let (ingredient, _) = self.database.get_or_create_ingredient(name).await?;
            ingredients.push(RecipeIngredientInput {
                ingredient_id: ingredient.id,
                quantity: item.quantity.trim().chars().take(MAX_QUANTITY_LENGTH).collect(),
                notes: item.notes.trim().to_owned(),
                order: i64::try_from(ingredients.len() + 1).unwrap_or(i64::MAX),
            });
        }

        let recipe = self
            .database
            .complete_generation(generation.id, &generated.into_new_recipe(generation.user_id, ingredients))
            .await?;
        Ok(recipe.id)
    }
}
