// tests/batch_tests.rs

use chem_institute_api::{config::Config, routes, state::AppState};
use serde_json::{Value, json};

/// Spawns the app on a random port with in-memory stores and returns
/// the base URL together with an admin token.
async fn spawn_app() -> (String, String) {
    let config = Config {
        jwt_secret: "batch_test_secret".to_string(),
        rust_log: "error".to_string(),
        admin_username: Some("admin".to_string()),
        admin_password: Some("admin_password".to_string()),
        ..Config::default()
    };
    let state = AppState::in_memory(config).expect("Failed to build state");
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let login: Value = reqwest::Client::new()
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "username": "admin", "password": "admin_password" }))
        .send()
        .await
        .expect("Failed to execute request")
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().expect("login returned no token").to_string();

    (address, token)
}

fn batch(title: &str) -> Value {
    json!({
        "title": title,
        "subtitle": "Target 99 percentile",
        "exam": "JEE",
        "batchType": "CRASH",
        "price": "₹4,999",
        "duration": "45 days",
        "schedule": "Mon-Sat, 6-8 PM",
        "startDate": "1st March",
        "features": ["Daily DPPs", "Weekly tests", "Doubt sessions"],
        "enrollmentLink": "https://example.com/enroll"
    })
}

async fn create_batch(client: &reqwest::Client, address: &str, token: &str, body: &Value) -> Value {
    let response = client
        .post(format!("{}/api/score-match-batches", address))
        .bearer_auth(token)
        .json(body)
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 201);
    response.json().await.unwrap()
}

#[tokio::test]
async fn create_batch_applies_defaults() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_batch(
        &client,
        &address,
        &token,
        &json!({ "title": "NEET Regular", "exam": "NEET", "price": "₹9,999" }),
    )
    .await;

    assert!(created["_id"].is_string());
    assert_eq!(created["batchType"], "REGULAR");
    assert_eq!(created["color"], "#2563eb");
    assert_eq!(created["isActive"], true);
    assert_eq!(created["features"], json!([]));
    assert!(created.get("badge").is_none());
}

#[tokio::test]
async fn create_batch_keeps_display_fields() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_batch(&client, &address, &token, &batch("JEE Crash")).await;

    assert_eq!(created["price"], "₹4,999");
    assert_eq!(created["startDate"], "1st March");
    assert_eq!(
        created["features"],
        json!(["Daily DPPs", "Weekly tests", "Doubt sessions"])
    );
}

#[tokio::test]
async fn invalid_batches_are_rejected() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let mut bad_color = batch("Bad color");
    bad_color["color"] = json!("blue");
    let mut bad_link = batch("Bad link");
    bad_link["enrollmentLink"] = json!("javascript:alert(1)");
    let mut empty_feature = batch("Empty feature");
    empty_feature["features"] = json!(["Tests", "   "]);
    let missing_price = json!({ "title": "No price", "exam": "JEE" });

    for body in [bad_color, bad_link, empty_feature, missing_price] {
        let response = client
            .post(format!("{}/api/score-match-batches", address))
            .bearer_auth(&token)
            .json(&body)
            .send()
            .await
            .expect("Failed to execute request");
        assert_eq!(response.status().as_u16(), 400, "body was accepted: {}", body);
    }
}

#[tokio::test]
async fn put_replaces_features_in_order() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_batch(&client, &address, &token, &batch("JEE Crash")).await;
    let id = created["_id"].as_str().unwrap();

    let response = client
        .put(format!("{}/api/score-match-batches/{}", address, id))
        .bearer_auth(&token)
        .json(&json!({ "features": ["Mock tests", "Mentorship"], "badge": "Popular" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["features"], json!(["Mock tests", "Mentorship"]));
    assert_eq!(updated["badge"], "Popular");
    assert_eq!(updated["title"], "JEE Crash");

    let stored: Value = client
        .get(format!("{}/api/score-match-batches/{}", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(stored["features"], json!(["Mock tests", "Mentorship"]));
}

#[tokio::test]
async fn update_rejects_invalid_color() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_batch(&client, &address, &token, &batch("JEE Crash")).await;
    let id = created["_id"].as_str().unwrap();

    let response = client
        .patch(format!("{}/api/score-match-batches/{}", address, id))
        .bearer_auth(&token)
        .json(&json!({ "color": "#12345" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn unknown_batch_404() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();
    let url = format!("{}/api/score-match-batches/{}", address, "65a1b2c3d4e5f60718293a4b");

    let get = client.get(&url).send().await.unwrap();
    assert_eq!(get.status().as_u16(), 404);
    let body: Value = get.json().await.unwrap();
    assert_eq!(body["message"], "Score match batch not found");

    let put = client
        .put(&url)
        .bearer_auth(&token)
        .json(&json!({ "title": "Ghost" }))
        .send()
        .await
        .unwrap();
    assert_eq!(put.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_batch_twice() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let title = format!("Batch {}", &uuid::Uuid::new_v4().to_string()[..8]);
    let created = create_batch(&client, &address, &token, &batch(&title)).await;
    assert_eq!(created["title"], title.as_str());
    let url = format!("{}/api/score-match-batches/{}", address, created["_id"].as_str().unwrap());

    let first = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(first.status().as_u16(), 200);
    let body: Value = first.json().await.unwrap();
    assert_eq!(body["message"], "Score match batch deleted successfully");

    let second = client.delete(&url).bearer_auth(&token).send().await.unwrap();
    assert_eq!(second.status().as_u16(), 404);
}

#[tokio::test]
async fn delete_requires_token() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let created = create_batch(&client, &address, &token, &batch("Protected")).await;
    let url = format!("{}/api/score-match-batches/{}", address, created["_id"].as_str().unwrap());

    let response = client.delete(&url).send().await.unwrap();
    assert_eq!(response.status().as_u16(), 401);

    let still_there = client.get(&url).send().await.unwrap();
    assert_eq!(still_there.status().as_u16(), 200);
}

#[tokio::test]
async fn list_filters_by_active_flag() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    create_batch(&client, &address, &token, &batch("Open")).await;
    let mut hidden = batch("Hidden");
    hidden["isActive"] = json!(false);
    create_batch(&client, &address, &token, &hidden).await;

    let all: Vec<Value> = client
        .get(format!("{}/api/score-match-batches", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let active = client
        .get(format!("{}/api/score-match-batches?active=true", address))
        .send()
        .await
        .unwrap();
    assert_eq!(active.headers()["x-total-count"], "1");
    let active: Vec<Value> = active.json().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0]["title"], "Open");
}

#[tokio::test]
async fn batch_writes_invalidate_only_batch_lists() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();
    let batches_url = format!("{}/api/score-match-batches", address);
    let quizzes_url = format!("{}/api/free-quizzes", address);

    // Warm both caches.
    client.get(&batches_url).send().await.unwrap();
    client.get(&quizzes_url).send().await.unwrap();

    create_batch(&client, &address, &token, &batch("New batch")).await;

    let batches = client.get(&batches_url).send().await.unwrap();
    assert_eq!(batches.headers()["x-cache"], "MISS");
    let quizzes = client.get(&quizzes_url).send().await.unwrap();
    assert_eq!(quizzes.headers()["x-cache"], "HIT");
}

#[tokio::test]
async fn openapi_document_is_served() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("{}/api/openapi.json", address))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);

    let doc: Value = response.json().await.unwrap();
    assert!(doc["paths"].get("/api/score-match-batches/{id}").is_some());
    assert!(doc["paths"].get("/api/free-quizzes").is_some());
    assert!(doc["components"]["securitySchemes"].get("jwt").is_some());
}

#[tokio::test]
async fn huge_batch_page_is_rejected() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!(
            "{}/api/score-match-batches?page=18446744073709551615&limit=100",
            address
        ))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 400);
}

#[tokio::test]
async fn blank_badge_clears_it() {
    let (address, token) = spawn_app().await;
    let client = reqwest::Client::new();

    let mut body = batch("Badged");
    body["badge"] = json!("Popular");
    let created = create_batch(&client, &address, &token, &body).await;
    assert_eq!(created["badge"], "Popular");
    let url = format!("{}/api/score-match-batches/{}", address, created["_id"].as_str().unwrap());

    let response = client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "badge": "" }))
        .send()
        .await
        .expect("Failed to execute request");
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert!(updated.get("badge").is_none());

    let stored: Value = client.get(&url).send().await.unwrap().json().await.unwrap();
    assert!(stored.get("badge").is_none());
    assert_eq!(stored["title"], "Badged");
}
