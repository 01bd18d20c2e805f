// ABOUTME: Integration tests for AI recipe generation with a scripted chat provider
// ABOUTME: Covers the 202 handoff, status polling, the finished recipe, and failures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use ashpazyar_server::errors::AppError;
use ashpazyar_server::generation::GenerationWorker;
use ashpazyar_server::llm::{ChatRequest, ChatResponse, LlmProvider};
use ashpazyar_server::models::{GenerationStatus, UserRole};
use async_trait::async_trait;
use common::{create_test_resources, create_test_resources_with_llm, create_user_with_token, test_router};
use helpers::axum_test::AxumTestRequest;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

const RECIPE_ANSWER: &str = r#"```json
{
  "title": "Kuku sabzi",
  "description": "Herb frittata",
  "instructions": ["Chop the herbs", "Whisk with eggs", "Cook covered"],
  "prep_time": 15,
  "cook_time": 25,
  "servings": 4,
  "difficulty": "medium",
  "ingredients": [
    { "name": "Eggs", "quantity": "6" },
    { "name": "Parsley", "quantity": "200g" },
    { "name": "eggs", "quantity": "1" }
  ]
}
```"#;

/// Chat provider that always answers with the same content
struct ScriptedProvider {
    answer: &'static str,
    calls: AtomicUsize,
}

impl ScriptedProvider {
    fn new(answer: &'static str) -> Arc<Self> {
        Arc::new(Self {
            answer,
            calls: AtomicUsize::new(0),
        })
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &'static str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        "scripted-1"
    }

    async fn complete(&self, request: &ChatRequest) -> Result<ChatResponse, AppError> {
        assert!(request.json_mode);
        assert_eq!(request.messages.len(), 2);
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(ChatResponse {
            content: self.answer.to_owned(),
            model: self.default_model().to_owned(),
            usage: None,
            finish_reason: Some("stop".to_owned()),
        })
    }
}

async fn wait_for_terminal_status(app: &axum::Router, token: &str, generation_id: i64) -> String {
    for _ in 0..100 {
        let body = AxumTestRequest::get(&format!("/api/generation/{generation_id}/status/"))
            .bearer(token)
            .send(app.clone())
            .await
            .assert_status(200)
            .json();
        let status = body["status"].as_str().unwrap().to_owned();
        if status == "completed" || status == "failed" {
            return status;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("generation {generation_id} never finished");
}

#[tokio::test]
async fn test_generate_creates_private_recipe() {
    let provider = ScriptedProvider::new(RECIPE_ANSWER);
    let resources = create_test_resources_with_llm(provider.clone()).await.unwrap();
    let (user, token) = create_user_with_token(&resources, "cook", UserRole::User)
        .await
        .unwrap();
    let (_, other_token) = create_user_with_token(&resources, "other", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    let generation = AxumTestRequest::post("/api/recipes/generate/")
        .bearer(&token)
        .json(&json!({ "prompt": "Something green for Nowruz" }))
        .send(app.clone())
        .await
        .assert_status(202)
        .json();
    assert_eq!(generation["status"], "pending");
    assert_eq!(generation["user"], user.id);
    let generation_id = generation["id"].as_i64().unwrap();

    AxumTestRequest::get(&format!("/api/generation/{generation_id}/"))
        .bearer(&other_token)
        .send(app.clone())
        .await
        .assert_status(404);

    let status = wait_for_terminal_status(&app, &token, generation_id).await;
    assert_eq!(status, "completed");
    assert_eq!(provider.calls.load(Ordering::SeqCst), 1);

    let recipe = AxumTestRequest::get(&format!("/api/generation/{generation_id}/result/"))
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(recipe["title"], "Kuku sabzi");
    assert_eq!(recipe["is_public"], false);
    assert_eq!(recipe["difficulty"], "medium");
    assert_eq!(recipe["instructions"], "Chop the herbs\nWhisk with eggs\nCook covered");
    assert_eq!(recipe["author"]["username"], "cook");
    let lines = recipe["recipe_ingredients"].as_array().unwrap();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["ingredient"]["name"], "Eggs");
    assert_eq!(lines[1]["quantity"], "200g");

    // Missing ingredients were added to the catalog
    let found = AxumTestRequest::get("/api/ingredients/search/?q=parsley")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(found.as_array().unwrap().len(), 1);

    // The generated recipe is private to its requester
    let recipe_id = recipe["id"].as_i64().unwrap();
    AxumTestRequest::get(&format!("/api/recipes/{recipe_id}/"))
        .bearer(&other_token)
        .send(app.clone())
        .await
        .assert_status(404);

    let page = AxumTestRequest::get("/api/generation/")
        .bearer(&token)
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(page["count"], 1);
}

#[tokio::test]
async fn test_generate_requires_prompt_and_auth() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "cook", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post("/api/recipes/generate/")
        .json(&json!({ "prompt": "Soup" }))
        .send(app.clone())
        .await
        .assert_status(401);

    let response = AxumTestRequest::post("/api/recipes/generate/")
        .bearer(&token)
        .json(&json!({ "prompt": "   " }))
        .send(app)
        .await
        .assert_status(400);
    assert_eq!(response.json()["error"]["code"], "MISSING_REQUIRED_FIELD");
}

#[tokio::test]
async fn test_generation_without_backend_stays_pending() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "cook", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    let generation = AxumTestRequest::post("/api/recipes/generate/")
        .bearer(&token)
        .json(&json!({ "prompt": "Soup" }))
        .send(app.clone())
        .await
        .assert_status(202)
        .json();
    let generation_id = generation["id"].as_i64().unwrap();

    let result = AxumTestRequest::get(&format!("/api/generation/{generation_id}/result/"))
        .bearer(&token)
        .send(app)
        .await
        .assert_status(202)
        .json();
    assert_eq!(result["status"], "pending");
}

#[tokio::test]
async fn test_unusable_answer_fails_generation() {
    let provider = ScriptedProvider::new("I would rather not cook today.");
    let resources = create_test_resources().await.unwrap();
    let (user, token) = create_user_with_token(&resources, "cook", UserRole::User)
        .await
        .unwrap();
    let generation = resources
        .database
        .create_generation(user.id, "Anything")
        .await
        .unwrap();

    let worker = GenerationWorker::new(resources.database.clone(), provider);
    assert_eq!(worker.process(&generation).await, GenerationStatus::Failed);

    let app = test_router(&resources);
    let result = AxumTestRequest::get(&format!("/api/generation/{}/result/", generation.id))
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(400)
        .json();
    assert_eq!(result["status"], "failed");
    assert!(result["error"].as_str().is_some_and(|e| !e.is_empty()));

    let detail = AxumTestRequest::get(&format!("/api/generation/{}/", generation.id))
        .bearer(&token)
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(detail["status"], "failed");
    assert!(detail["error_message"].is_string());
}
