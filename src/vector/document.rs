// ABOUTME: Vector search wire types and the recipe-to-document conversion
// ABOUTME: Shared by the vector server, the search client, and the dataset push command
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

use crate::constants::vector::{DEFAULT_SEARCH_LIMIT, UNKNOWN_CALORY};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

/// One dataset record as accepted by `/insert` and read by the importer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeInput {
    /// Dish name
    pub foodname: String,
    /// Raw ingredient name to quantity
    pub ingredients: BTreeMap<String, String>,
    /// Normalised ingredient names used for filtering
    pub canonical: Vec<String>,
    /// Preparation steps
    pub recipe: Vec<String>,
    /// Calorie label
    #[serde(default)]
    pub calory: Option<String>,
    /// Free-text durations such as `"45 دقیقه"`
    #[serde(default)]
    pub taken_time: Option<Vec<String>>,
    /// Image URLs
    #[serde(default)]
    pub images: Vec<String>,
    /// Dataset position
    pub index: f64,
    /// Question to answer pairs
    pub questions: BTreeMap<String, String>,
}

/// `/insert` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRequest {
    /// Records to embed and store
    pub recipes: Vec<RecipeInput>,
}

/// `/search` body
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    /// Free-text query; blank lists stored documents instead
    pub query: String,
    /// Every name must appear in a document's canonical list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub include_ingredients: Option<Vec<String>>,
    /// Maximum hits
    #[serde(default = "default_limit")]
    pub limit: usize,
}

const fn default_limit() -> usize {
    DEFAULT_SEARCH_LIMIT
}

/// One `/search` result
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    /// Cosine distance to the query, 0.0 for blank queries
    pub score: f32,
    /// Dish name
    pub foodname: String,
    /// Raw ingredient name to quantity
    pub ingredients: BTreeMap<String, String>,
    /// Image URLs
    pub images: Vec<String>,
    /// Calorie label
    pub calory: String,
    /// Document text
    pub recipe: String,
    /// Question to answer pairs
    pub questions: BTreeMap<String, String>,
}

/// Filterable document metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// Dish name
    pub foodname: String,
    /// Calorie label, `Unknown` when the record had none
    pub calory: String,
    /// Dataset position
    pub index: f64,
    /// Image URLs
    pub images: Vec<String>,
    /// Normalised ingredient names
    pub canonical: Vec<String>,
    /// First duration entry
    pub taken_time: String,
    /// Raw ingredient name to quantity
    pub detailed_ingredients: BTreeMap<String, String>,
    /// Question to answer pairs
    pub questions: BTreeMap<String, String>,
}

/// Stored, embedded recipe document
#[derive(Debug, Clone, PartialEq)]
pub struct VectorDocument {
    /// Random identifier
    pub id: Uuid,
    /// Text that was embedded
    pub page_content: String,
    /// Metadata
    pub metadata: DocumentMetadata,
    /// Embedding of `page_content`
    pub embedding: Vec<f32>,
}

impl VectorDocument {
    /// Text embedded for a record: the dish name and its steps
    #[must_use]
    pub fn page_content(input: &RecipeInput) -> String {
        format!(
            "نام غذا: {}\nدستور پخت: {}",
            input.foodname,
            input.recipe.join(" ")
        )
    }

    /// Build a document with a fresh id from a record and its embedding
    #[must_use]
    pub fn from_input(input: RecipeInput, embedding: Vec<f32>) -> Self {
        let page_content = Self::page_content(&input);
        let calory = input
            .calory
            .filter(|calory| !calory.is_empty())
            .unwrap_or_else(|| UNKNOWN_CALORY.to_owned());
        let taken_time = input
            .taken_time
            .and_then(|times| times.into_iter().next())
            .unwrap_or_default();

        Self {
            id: Uuid::new_v4(),
            page_content,
            metadata: DocumentMetadata {
                foodname: input.foodname,
                calory,
                index: input.index,
                images: input.images,
                canonical: input.canonical,
                taken_time,
                detailed_ingredients: input.ingredients,
                questions: input.questions,
            },
            embedding,
        }
    }

    /// Whether every name in `required` is one of the canonical ingredients
    #[must_use]
    pub fn has_all_ingredients(&self, required: &[String]) -> bool {
        required.iter().all(|name| {
            self.metadata
                .canonical
                .iter()
                .any(|canonical| canonical.trim() == name.as_str())
        })
    }

    /// Search response item for this document
    #[must_use]
    pub fn to_hit(&self, score: f32) -> SearchHit {
        SearchHit {
            score,
            foodname: self.metadata.foodname.clone(),
            ingredients: self.metadata.detailed_ingredients.clone(),
            images: self.metadata.images.clone(),
            calory: self.metadata.calory.clone(),
            recipe: self.page_content.clone(),
            questions: self.metadata.questions.clone(),
        }
    }
}
