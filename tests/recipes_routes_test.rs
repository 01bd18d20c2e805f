// ABOUTME: Integration tests for recipe listing, CRUD, visibility, rating and sharing
// ABOUTME: Covers pagination envelopes, filters, author checks and the public share link
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Ashpazyar Contributors

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
#![allow(missing_docs)]

mod common;
mod helpers;

use ashpazyar_server::models::{NewIngredient, UserRole};
use common::{
    create_test_recipe, create_test_resources, create_user_with_token, ingredient_line,
    test_router,
};
use chrono::{Duration, Utc};
use helpers::axum_test::AxumTestRequest;
use serde_json::json;
use uuid::Uuid;

#[tokio::test]
async fn test_create_and_fetch_recipe() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    let rice = resources
        .database
        .create_ingredient(&NewIngredient::named("Rice"))
        .await
        .unwrap();
    let app = test_router(&resources);

    let created = AxumTestRequest::post("/api/recipes/")
        .bearer(&token)
        .json(&json!({
            "title": "Chelow",
            "description": "Steamed rice",
            "instructions": "Soak, boil, steam",
            "prep_time": 15,
            "cook_time": 60,
            "difficulty": "hard",
            "ingredients": [{ "ingredient_id": rice.id, "quantity": "2 cups", "order": 1 }],
        }))
        .send(app.clone())
        .await
        .assert_status(201)
        .json();
    assert_eq!(created["title"], "Chelow");
    assert_eq!(created["servings"], 4);
    assert_eq!(created["difficulty"], "hard");
    assert_eq!(created["author"]["username"], "chef");
    assert_eq!(created["recipe_ingredients"][0]["ingredient"]["name"], "Rice");
    assert_eq!(created["recipe_ingredients"][0]["quantity"], "2 cups");

    let id = created["id"].as_i64().unwrap();
    let fetched = AxumTestRequest::get(&format!("/api/recipes/{id}/"))
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(fetched["id"], id);
}

#[tokio::test]
async fn test_create_validation() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post("/api/recipes/")
        .json(&json!({ "title": "Anonymous", "instructions": "x" }))
        .send(app.clone())
        .await
        .assert_status(401);

    for body in [
        json!({ "instructions": "x" }),
        json!({ "title": "T", "instructions": "  " }),
        json!({ "title": "T", "instructions": "x", "difficulty": "extreme" }),
        json!({ "title": "T", "instructions": "x", "servings": 0 }),
        json!({ "title": "T", "instructions": "x", "category_id": 999 }),
        json!({ "title": "T", "instructions": "x", "ingredients": [{ "ingredient_id": 42 }] }),
    ] {
        AxumTestRequest::post("/api/recipes/")
            .bearer(&token)
            .json(&body)
            .send(app.clone())
            .await
            .assert_status(400);
    }
}

#[tokio::test]
async fn test_private_recipes_are_hidden_from_others() {
    let resources = create_test_resources().await.unwrap();
    let (owner, owner_token) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let (_, other_token) = create_user_with_token(&resources, "other", UserRole::User)
        .await
        .unwrap();
    let public = create_test_recipe(&resources.database, owner.id, "Ash Reshteh", true, Vec::new())
        .await
        .unwrap();
    let private = create_test_recipe(&resources.database, owner.id, "Secret Stew", false, Vec::new())
        .await
        .unwrap();
    let app = test_router(&resources);

    let anonymous = AxumTestRequest::get("/api/recipes/")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(anonymous["count"], 1);
    assert_eq!(anonymous["results"][0]["id"], public.id);
    assert!(anonymous["next"].is_null());
    assert!(anonymous["previous"].is_null());

    let own = AxumTestRequest::get("/api/recipes/")
        .bearer(&owner_token)
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(own["count"], 2);

    let path = format!("/api/recipes/{}/", private.id);
    AxumTestRequest::get(&path)
        .send(app.clone())
        .await
        .assert_status(404);
    AxumTestRequest::get(&path)
        .bearer(&other_token)
        .send(app.clone())
        .await
        .assert_status(404);
    AxumTestRequest::get(&path)
        .bearer(&owner_token)
        .send(app)
        .await
        .assert_status(200);
}

#[tokio::test]
async fn test_list_filters_and_pagination() {
    let resources = create_test_resources().await.unwrap();
    let (chef, _) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    for title in ["Kuku Sabzi", "Kuku Sibzamini", "Mirza Ghasemi"] {
        create_test_recipe(&resources.database, chef.id, title, true, Vec::new())
            .await
            .unwrap();
    }
    let app = test_router(&resources);

    let searched = AxumTestRequest::get("/api/recipes/?search=kuku")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(searched["count"], 2);

    let first = AxumTestRequest::get("/api/recipes/?page_size=2")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(first["count"], 3);
    assert_eq!(first["results"].as_array().unwrap().len(), 2);
    let next = first["next"].as_str().unwrap();
    assert!(next.contains("page=2"));
    assert!(next.contains("page_size=2"));

    let second = AxumTestRequest::get("/api/recipes/?page_size=2&page=2")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(second["results"].as_array().unwrap().len(), 1);
    assert!(second["next"].is_null());
    assert!(second["previous"].is_string());

    AxumTestRequest::get("/api/recipes/?page_size=2&page=5")
        .send(app.clone())
        .await
        .assert_status(404);

    AxumTestRequest::get("/api/recipes/?difficulty=impossible")
        .send(app.clone())
        .await
        .assert_status(400);

    let by_author = AxumTestRequest::get(&format!("/api/recipes/?author={}", chef.id))
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(by_author["count"], 3);
}

#[tokio::test]
async fn test_update_and_delete_require_author_or_admin() {
    let resources = create_test_resources().await.unwrap();
    let (owner, owner_token) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let (_, other_token) = create_user_with_token(&resources, "other", UserRole::User)
        .await
        .unwrap();
    let (_, admin_token) = create_user_with_token(&resources, "admin", UserRole::Admin)
        .await
        .unwrap();
    let recipe = create_test_recipe(&resources.database, owner.id, "Fesenjan", true, Vec::new())
        .await
        .unwrap();
    let path = format!("/api/recipes/{}/", recipe.id);
    let app = test_router(&resources);

    AxumTestRequest::patch(&path)
        .bearer(&other_token)
        .json(&json!({ "title": "Stolen" }))
        .send(app.clone())
        .await
        .assert_status(403);

    let updated = AxumTestRequest::patch(&path)
        .bearer(&owner_token)
        .json(&json!({ "title": "Fesenjan with duck", "is_public": false }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(updated["title"], "Fesenjan with duck");

    AxumTestRequest::delete(&path)
        .bearer(&other_token)
        .send(app.clone())
        .await
        .assert_status(404);

    AxumTestRequest::patch(&path)
        .bearer(&admin_token)
        .json(&json!({ "is_public": true }))
        .send(app.clone())
        .await
        .assert_status(404);

    AxumTestRequest::delete(&path)
        .bearer(&owner_token)
        .send(app.clone())
        .await
        .assert_status(204);
    AxumTestRequest::get(&path)
        .bearer(&owner_token)
        .send(app)
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_rating_updates_aggregate() {
    let resources = create_test_resources().await.unwrap();
    let (owner, _) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let (_, first_token) = create_user_with_token(&resources, "first", UserRole::User)
        .await
        .unwrap();
    let (_, second_token) = create_user_with_token(&resources, "second", UserRole::User)
        .await
        .unwrap();
    let recipe = create_test_recipe(&resources.database, owner.id, "Tahdig", true, Vec::new())
        .await
        .unwrap();
    let rate_path = format!("/api/recipes/{}/rate/", recipe.id);
    let app = test_router(&resources);

    AxumTestRequest::post(&rate_path)
        .bearer(&first_token)
        .json(&json!({ "rating": 6 }))
        .send(app.clone())
        .await
        .assert_status(400);

    AxumTestRequest::post(&rate_path)
        .bearer(&first_token)
        .json(&json!({ "rating": 2, "comment": "Burnt" }))
        .send(app.clone())
        .await
        .assert_status(201);
    AxumTestRequest::post(&rate_path)
        .bearer(&first_token)
        .json(&json!({ "rating": 4 }))
        .send(app.clone())
        .await
        .assert_status(200);
    AxumTestRequest::post(&rate_path)
        .bearer(&second_token)
        .json(&json!({ "rating": "5" }))
        .send(app.clone())
        .await
        .assert_status(201);

    let list = AxumTestRequest::get("/api/recipes/")
        .send(app)
        .await
        .assert_status(200)
        .json();
    let summary = &list["results"][0];
    assert_eq!(summary["ratings_count"], 2);
    assert!((summary["average_rating"].as_f64().unwrap() - 4.5).abs() < f64::EPSILON);
}

#[tokio::test]
async fn test_by_ingredients_and_similar() {
    let resources = create_test_resources().await.unwrap();
    let (chef, _) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    let database = &resources.database;
    let egg = database.create_ingredient(&NewIngredient::named("Egg")).await.unwrap();
    let herbs = database.create_ingredient(&NewIngredient::named("Herbs")).await.unwrap();
    let both = create_test_recipe(
        database,
        chef.id,
        "Kuku Sabzi",
        true,
        vec![ingredient_line(egg.id, "4", 1), ingredient_line(herbs.id, "1 bunch", 2)],
    )
    .await
    .unwrap();
    let egg_only = create_test_recipe(database, chef.id, "Omelette", true, vec![ingredient_line(egg.id, "2", 1)])
        .await
        .unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post("/api/recipes/by_ingredients/")
        .json(&json!({ "ingredient_ids": [] }))
        .send(app.clone())
        .await
        .assert_status(400);

    let matches = AxumTestRequest::post("/api/recipes/by_ingredients/")
        .json(&json!({ "ingredient_ids": [egg.id, herbs.id] }))
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(matches[0]["id"], both.id);
    assert_eq!(matches[1]["id"], egg_only.id);

    AxumTestRequest::get(&format!("/api/recipes/{}/similar/", both.id))
        .send(app)
        .await
        .assert_status(200);
}

#[tokio::test]
async fn test_share_link_counts_views() {
    let resources = create_test_resources().await.unwrap();
    let (owner, owner_token) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let private = create_test_recipe(&resources.database, owner.id, "Family Dolmeh", false, Vec::new())
        .await
        .unwrap();
    let app = test_router(&resources);
    let share_path = format!("/api/recipes/{}/share/", private.id);

    let share = AxumTestRequest::post(&share_path)
        .bearer(&owner_token)
        .send(app.clone())
        .await
        .assert_status(201)
        .json();
    let share_id = share["share_id"].as_str().unwrap().to_owned();
    assert_eq!(share["share_url"], format!("/api/share/{share_id}/"));

    let again = AxumTestRequest::post(&share_path)
        .bearer(&owner_token)
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(again["share_id"], share_id.as_str());

    for expected_views in 1..=2 {
        let shared = AxumTestRequest::get(&format!("/api/share/{share_id}/"))
            .send(app.clone())
            .await
            .assert_status(200)
            .json();
        assert_eq!(shared["recipe"]["title"], "Family Dolmeh");
        assert_eq!(shared["view_count"], expected_views);
    }

    AxumTestRequest::get("/api/share/not-a-uuid/")
        .send(app.clone())
        .await
        .assert_status(404);
    AxumTestRequest::get("/api/share/00000000-0000-0000-0000-000000000000/")
        .send(app)
        .await
        .assert_status(404);
}

#[tokio::test]
async fn test_semantic_search_without_vector_server() {
    let resources = create_test_resources().await.unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post("/api/recipes/semantic_search/")
        .json(&json!({ "limit": 3 }))
        .send(app.clone())
        .await
        .assert_status(400);

    let body = AxumTestRequest::post("/api/recipes/semantic_search/")
        .json(&json!({ "query": "saffron rice", "include_ingredients": ["rice"] }))
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(body["vector_hits"], 0);
    assert_eq!(body["results"], json!([]));
}

#[tokio::test]
async fn test_malformed_bodies_use_error_envelope() {
    let resources = create_test_resources().await.unwrap();
    let (owner, token) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let recipe = create_test_recipe(&resources.database, owner.id, "Sholeh zard", true, Vec::new())
        .await
        .unwrap();
    let rate_path = format!("/api/recipes/{}/rate/", recipe.id);
    let app = test_router(&resources);

    for body in [json!({ "rating": "five" }), json!({ "rating": [5] })] {
        let response = AxumTestRequest::post(&rate_path)
            .bearer(&token)
            .json(&body)
            .send(app.clone())
            .await
            .assert_status(400)
            .json();
        assert_eq!(response["error"]["code"], "INVALID_INPUT");
        assert!(response["error"]["message"].as_str().unwrap().contains("rating"));
    }

    let response = AxumTestRequest::post("/api/recipes/")
        .bearer(&token)
        .json(&json!({ "title": "Ash", "prep_time": "soon" }))
        .send(app.clone())
        .await
        .assert_status(400)
        .json();
    assert_eq!(response["error"]["code"], "INVALID_INPUT");

    // No JSON content type
    let response = AxumTestRequest::post(&rate_path)
        .bearer(&token)
        .send(app)
        .await
        .assert_status(400)
        .json();
    assert_eq!(response["error"]["code"], "INVALID_INPUT");
}

#[tokio::test]
async fn test_list_ordering() {
    let resources = create_test_resources().await.unwrap();
    let (_, token) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    let app = test_router(&resources);
    for (title, prep_time) in [("Quick", 5), ("Slow", 90), ("Medium", 30)] {
        AxumTestRequest::post("/api/recipes/")
            .bearer(&token)
            .json(&json!({
                "title": title,
                "instructions": "Cook",
                "prep_time": prep_time,
                "cook_time": 10,
                "is_public": true,
            }))
            .send(app.clone())
            .await
            .assert_status(201);
    }

    let titles = |page: &serde_json::Value| -> Vec<String> {
        page["results"]
            .as_array()
            .unwrap()
            .iter()
            .map(|r| r["title"].as_str().unwrap().to_owned())
            .collect()
    };

    let page = AxumTestRequest::get("/api/recipes/?ordering=prep_time")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(titles(&page), vec!["Quick", "Medium", "Slow"]);

    let page = AxumTestRequest::get("/api/recipes/?ordering=-prep_time")
        .send(app.clone())
        .await
        .assert_status(200)
        .json();
    assert_eq!(titles(&page), vec!["Slow", "Medium", "Quick"]);

    // Unknown fields fall back to newest first
    let page = AxumTestRequest::get("/api/recipes/?ordering=title")
        .send(app)
        .await
        .assert_status(200)
        .json();
    assert_eq!(titles(&page), vec!["Medium", "Slow", "Quick"]);
}

#[tokio::test]
async fn test_similar_recipes_are_newest_first() {
    let resources = create_test_resources().await.unwrap();
    let (chef, _) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    let (_, critic_token) = create_user_with_token(&resources, "critic", UserRole::User)
        .await
        .unwrap();
    let database = &resources.database;
    let lamb = database.create_ingredient(&NewIngredient::named("Lamb")).await.unwrap();
    let base = create_test_recipe(database, chef.id, "Dizi", true, vec![ingredient_line(lamb.id, "500g", 1)])
        .await
        .unwrap();
    let older = create_test_recipe(database, chef.id, "older", true, vec![ingredient_line(lamb.id, "1kg", 1)])
        .await
        .unwrap();
    create_test_recipe(database, chef.id, "newer", true, vec![ingredient_line(lamb.id, "300g", 1)])
        .await
        .unwrap();
    let app = test_router(&resources);

    AxumTestRequest::post(&format!("/api/recipes/{}/rate/", older.id))
        .bearer(&critic_token)
        .json(&json!({ "rating": 5 }))
        .send(app.clone())
        .await
        .assert_status(201);

    let similar = AxumTestRequest::get(&format!("/api/recipes/{}/similar/", base.id))
        .send(app)
        .await
        .assert_status(200)
        .json();
    let titles: Vec<&str> = similar
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["newer", "older"]);
}

#[tokio::test]
async fn test_search_matches_accented_titles_case_insensitively() {
    let resources = create_test_resources().await.unwrap();
    let (chef, _) = create_user_with_token(&resources, "chef", UserRole::User)
        .await
        .unwrap();
    create_test_recipe(&resources.database, chef.id, "Éclair au café", true, Vec::new())
        .await
        .unwrap();
    let app = test_router(&resources);

    for term in ["Éclair", "ÉCLAIR", "AU café", "au café"] {
        let page = AxumTestRequest::get(&format!("/api/recipes/?search={}", urlencoding(term)))
            .send(app.clone())
            .await
            .assert_status(200)
            .json();
        assert_eq!(page["count"], 1, "search for {term}");
    }
}

#[tokio::test]
async fn test_expired_share_link_is_not_found() {
    let resources = create_test_resources().await.unwrap();
    let (owner, owner_token) = create_user_with_token(&resources, "owner", UserRole::User)
        .await
        .unwrap();
    let recipe = create_test_recipe(&resources.database, owner.id, "Baghali polo", false, Vec::new())
        .await
        .unwrap();
    let app = test_router(&resources);

    let share = AxumTestRequest::post(&format!("/api/recipes/{}/share/", recipe.id))
        .bearer(&owner_token)
        .send(app.clone())
        .await
        .assert_status(201)
        .json();
    let share_id = Uuid::parse_str(share["share_id"].as_str().unwrap()).unwrap();
    let share_path = format!("/api/share/{share_id}/");

    let expiry = Utc::now() + Duration::days(1);
    assert!(resources.database.set_share_expiry(share_id, Some(expiry)).await.unwrap());
    AxumTestRequest::get(&share_path)
        .send(app.clone())
        .await
        .assert_status(200);

    let expiry = Utc::now() - Duration::minutes(1);
    resources.database.set_share_expiry(share_id, Some(expiry)).await.unwrap();
    let response = AxumTestRequest::get(&share_path)
        .send(app)
        .await
        .assert_status(404);
    assert_eq!(response.json()["error"]["code"], "RESOURCE_NOT_FOUND");

    // Expired views are not counted
    let stored = resources.database.get_share(share_id).await.unwrap().unwrap();
    assert_eq!(stored.view_count, 1);
}

fn urlencoding(term: &str) -> String {
    url::form_urlencoded::byte_serialize(term.as_bytes()).collect()
}
