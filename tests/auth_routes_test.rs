// ABOUTME: Integration tests for registration, JWT login/refresh, and account endpoints
// ABOUTME: Drives the full router in-process against an in-memory database
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use ashpazyar_server::models::UserRole;
use common::{create_test_resources, create_user_with_token, test_router, TEST_PASSWORD};
use helpers::axum_test::AxumTestRequest;
use serde_json::json;

fn registration(username: &str) -> serde_json::Value {
    json!({
        "username": username,
        "email": format!("{username}@example.com"),
        "password": "pa55word-long",
        "password_confirmation": "pa55word-long",
        "first_name": "Sara",
        "student_number": "9912345",
    })
}

#[tokio::test]
async fn test_register_returns_user_profile_and_tokens() {
    let resources = create_test_resources().await.unwrap();

    let response = AxumTestRequest::post("/api/auth/users/")
        .json(&registration("sara"))
        .send(test_router(&resources))
        .await
        .assert_status(201);

    let body = response.json();
    assert_eq!(body["user"]["username"], "sara");
    assert_eq!(body["user"]["student_number"], "9912345");
    assert!(body["user"].get("password_hash").is_none());
    assert_eq!(body["user"]["profile"]["cooking_skill_level"], "beginner");
    assert!(body["access"].as_str().is_some_and(|t| !t.is_empty()));
    assert!(body["refresh"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_register_rejects_bad_payloads() {
    let resources = create_test_resources().await.unwrap();
    let app = test_router(&resources);

    let mut mismatched = registration("amir");
    mismatched["password_confirmation"] = json!("something-else");
    AxumTestRequest::post("/api/auth/users/")
        .json(&mismatched)
        .send(app.clone())
        .await
        .assert_status(400);

    let mut bad_email = registration("amir");
    bad_email["email"] = json!("not-an-email");
    AxumTestRequest::post("/api/auth/users/")
        .json(&bad_email)
        .send(app.clone())
        .await
        .assert_status(400);

    let mut short_password = registration("amir");
    short_password["password"] = json!("short");
    short_password["password_confirmation"] = json!("short");
    AxumTestRequest::post("/api/auth/users/")
        .json(&short_password)
        .send(app.clone())
        .await
        .assert_status(400);

    let missing = json!({ "email": "x@example.com", "password": "pa55word-long" });
    let response = AxumTestRequest::post("/api/auth/users/")
        .json(&missing)
        .send(app.clone())
        .await
        .assert_status(400);
    assert_eq!(response.json()["error"]["code"], "MISSING_REQUIRED_FIELD");

    AxumTestRequest::post("/api/auth/users/")
        .json(&registration("amir"))
        .send(app.clone())
        .await
        .assert_status(201);

    let mut duplicate = registration("amir");
    duplicate["student_number"] = json!("different");
    AxumTestRequest::post("/api/auth/users/")
        .json(&duplicate)
        .send(app.clone())
        .await
        .assert_status(400);

    let mut same_number = registration("neda");
    same_number["student_number"] = json!("9912345");
    AxumTestRequest::post("/api/auth/users/")
        .json(&same_number)
        .send(app)
        .await
        .assert_status(400);
}

#[tokio::test]
async fn test_login_and_refresh() {
    let resources = create_test_resources().await.unwrap();
    create_user_with_token(&resources, "reza", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post("/api/auth/jwt/create/")
        .json(&json!({ "username": "reza", "password": "wrong-password" }))
        .send(app.clone())
        .await
        .assert_status(401);

    let tokens = AxumTestRequest::post("/api/auth/jwt/create/")
        .json(&json!({ "username": "reza", "password": TEST_PASSWORD }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    let access = tokens["access"].as_str().unwrap().to_owned();
    let refresh = tokens["refresh"].as_str().unwrap().to_owned();

    let refreshed = AxumTestRequest::post("/api/auth/jwt/refresh/")
        .json(&json!({ "refresh": refresh }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert!(refreshed["access"].is_string());

    // An access token is not accepted as a refresh token
    AxumTestRequest::post("/api/auth/jwt/refresh/")
        .json(&json!({ "refresh": access }))
        .send(app.clone())
        .await
        .assert_status(401);

    let me = AxumTestRequest::get("/api/auth/users/me/")
        .bearer(&access)
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(me["username"], "reza");
}

#[tokio::test]
async fn test_me_requires_valid_token() {
    let resources = create_test_resources().await.unwrap();
    let app = test_router(&resources);

    let response = AxumTestRequest::get("/api/auth/users/me/")
        .send(app.clone())
        .await
        .assert_status(401);
    assert_eq!(response.json()["error"]["code"], "AUTH_REQUIRED");

    AxumTestRequest::get("/api/auth/users/me/")
        .bearer("not.a.jwt")
        .send(app.clone())
        .await
        .assert_status(401);

    AxumTestRequest::get("/api/auth/users/me/")
        .header("authorization", "Token abc")
        .send(app)
        .await
        .assert_status(401);
}

#[tokio::test]
async fn test_update_me_and_password_change() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "mina", UserRole::User)
        .await
        .unwrap();
    create_user_with_token(&resources, "taken", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    let updated = AxumTestRequest::patch("/api/auth/users/me/")
        .bearer(&token)
        .json(&json!({ "first_name": "Mina", "biography": "Loves saffron" }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(updated["first_name"], "Mina");
    assert_eq!(updated["biography"], "Loves saffron");

    AxumTestRequest::patch("/api/auth/users/me/")
        .bearer(&token)
        .json(&json!({ "username": "taken" }))
        .send(app.clone())
        .await
        .assert_status(400);

    AxumTestRequest::patch("/api/auth/users/me/")
        .bearer(&token)
        .json(&json!({ "password": "new-password-1", "password_confirmation": "nope" }))
        .send(app.clone())
        .await
        .assert_status(400);

    AxumTestRequest::put("/api/auth/users/me/")
        .bearer(&token)
        .json(&json!({ "password": "new-password-1", "password_confirmation": "new-password-1" }))
        .send(app.clone())
        .await
        .assert_status(200);

    AxumTestRequest::post("/api/auth/jwt/create/")
        .json(&json!({ "username": "mina", "password": "new-password-1" }))
        .send(app)
        .await
        .assert_status(200);
}

#[tokio::test]
async fn test_profile_and_dietary_preferences() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "parisa", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    let profile = AxumTestRequest::get("/api/auth/profile/")
        .bearer(&token)
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(profile["cooking_skill_level"], "beginner");

    let profile = AxumTestRequest::patch("/api/auth/profile/")
        .bearer(&token)
        .json(&json!({
            "favorite_cuisines": ["persian", "turkish"],
            "cooking_skill_level": "advanced",
        }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(profile["favorite_cuisines"], json!(["persian", "turkish"]));
    assert_eq!(profile["cooking_skill_level"], "advanced");

    AxumTestRequest::patch("/api/auth/profile/")
        .bearer(&token)
        .json(&json!({ "cooking_skill_level": "wizard" }))
        .send(app.clone())
        .await
        .assert_status(400);

    AxumTestRequest::put("/api/auth/dietary-preferences/")
        .bearer(&token)
        .json(&json!({ "dietary_preferences": ["not", "an", "object"] }))
        .send(app.clone())
        .await
        .assert_status(400);

    AxumTestRequest::put("/api/auth/dietary-preferences/")
        .bearer(&token)
        .json(&json!({ "dietary_preferences": { "vegetarian": true } }))
        .send(app.clone())
        .await
        .assert_status(200);

    let preferences = AxumTestRequest::get("/api/auth/dietary-preferences/")
        .bearer(&token)
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(preferences["dietary_preferences"]["vegetarian"], true);
    assert_eq!(preferences["favorite_cuisines"], json!(["persian", "turkish"]));
    assert_eq!(preferences["cooking_skill_level"], "advanced");
    assert_eq!(preferences.as_object().unwrap().len(), 3);
}
