use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use krishi_mitr::api::server::{AppState, build_router};
use krishi_mitr::db::models::Document;
use krishi_mitr::db::store::{JsonFileStore, MemoryStore, Store, StoreError};
use serde_json::{Value, json};
use std::sync::Arc;
use tower::ServiceExt; // for .oneshot()

fn test_app() -> Router {
    build_router(Arc::new(AppState::new(Arc::new(MemoryStore::new()))))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let req = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let resp = app.clone().oneshot(req).await.unwrap();
    let status = resp.status();
    let bytes = to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    send(app, "POST", uri, Some(body)).await
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    send(app, "GET", uri, None).await
}

fn creds(username: &str, password: &str) -> Value {
    json!({ "username": username, "password": password })
}

#[tokio::test]
async fn register_then_duplicate() {
    let app = test_app();
    let alice = creds("alice", "p1");

    let (status, body) = post(&app, "/api/auth/register", alice.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "message": "User registered successfully" }));

    let (status, body) = post(&app, "/api/auth/register", alice).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({ "error": "User already exists" }));
}

#[tokio::test]
async fn register_missing_fields() {
    let app = test_app();
    let (status, body) = post(&app, "/api/auth/register", json!({ "username": "alice" })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Username and password required");

    let (status, body) = post(&app, "/api/auth/register", creds("", "x")).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn malformed_body_is_bad_request() {
    let app = test_app();
    let req = Request::builder()
        .method("POST")
        .uri("/api/auth/register")
        .header("content-type", "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn login_flow() {
    let app = test_app();
    post(&app, "/api/auth/register", creds("alice", "p1")).await;

    let (status, body) = post(&app, "/api/auth/login", creds("alice", "p1")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Login successful");
    assert_eq!(body["username"], "alice");

    let (status, body) = post(&app, "/api/auth/login", creds("alice", "nope")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, json!({ "error": "Invalid username or password" }));
}

#[tokio::test]
async fn add_barter_crop_and_search() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/crop/add",
        json!({ "name": "Wheat", "type": "Barter", "owner": "alice", "barterFor": "Corn" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Crop added successfully");
    assert_eq!(
        body["crop"],
        json!({
            "id": 1,
            "name": "Wheat",
            "type": "Barter",
            "owner": "alice",
            "barterFor": "Corn",
            "price": null
        })
    );

    let (status, body) = get(&app, "/api/crop/barter/corn").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["id"], 1);

    let (status, body) = get(&app, "/api/crop/barter/rice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({ "message": "No matching barter crops found" }));
}

#[tokio::test]
async fn resell_crop_search() {
    let app = test_app();
    let (status, body) = post(
        &app,
        "/api/crop/add",
        json!({
            "name": "Rice",
            "type": "Resell",
            "owner": "bob",
            "price": 35.5,
            "barterFor": "Corn"
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["crop"]["price"], 35.5);
    assert_eq!(body["crop"]["barterFor"], Value::Null);

    let (status, body) = get(&app, "/api/crop/resell/RICE").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["name"], "Rice");

    let (status, body) = get(&app, "/api/crop/resell/wheat").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No crops available for sale");
}

#[tokio::test]
async fn add_crop_missing_fields() {
    let app = test_app();
    let listing = json!({ "name": "Wheat", "type": "Barter" });
    let (status, body) = post(&app, "/api/crop/add", listing).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Crop name, type, and owner are required");

    let (_, all) = get(&app, "/api/crop/all").await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn list_all_keeps_insertion_order() {
    let app = test_app();
    for name in ["A", "B", "C"] {
        post(
            &app,
            "/api/crop/add",
            json!({ "name": name, "type": "Resell", "owner": "alice", "price": 1 }),
        )
        .await;
    }

    let (status, body) = get(&app, "/api/crop/all").await;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<_> = body.as_array().unwrap().iter().map(|c| c["name"].clone()).collect();
    assert_eq!(names, vec![json!("A"), json!("B"), json!("C")]);
    let ids: Vec<_> = body.as_array().unwrap().iter().map(|c| c["id"].as_u64().unwrap()).collect();
    assert_eq!(ids, vec![1, 2, 3]);

    let (_, listed) = get(&app, "/api/crop/list").await;
    assert_eq!(listed, body);
}

#[tokio::test]
async fn routes_need_no_login() {
    let app = test_app();
    let (status, _) = get(&app, "/api/crop/all").await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(
        &app,
        "/api/crop/add",
        json!({ "name": "Wheat", "type": "barter", "owner": "ghost", "exchange_for": "Corn" }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn pricing_endpoints() {
    let app = test_app();
    let (status, body) = get(&app, "/api/pricing").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!([]));

    let (status, _) = post(&app, "/api/pricing", json!({})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let prices = json!({
        "prices": [
            {
                "crop": "Wheat",
                "category": "Cereals",
                "msp": 2275,
                "market_price": 2400,
                "last_updated": "2023-11-15"
            }
        ]
    });
    let (status, body) = post(&app, "/api/pricing", prices).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Prices updated successfully");

    let (status, body) = get(&app, "/api/pricing/wheat").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["market_price"], 2400.0);

    let (status, body) = get(&app, "/api/pricing/rice").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Price not found");
}

#[tokio::test]
async fn health_and_unknown_routes() {
    let app = test_app();
    let req = Request::builder().uri("/health").body(Body::empty()).unwrap();
    let resp = app.clone().oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let (status, _) = get(&app, "/api/nonexistent").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

struct ReadOnlyStore;

#[async_trait]
impl Store for ReadOnlyStore {
    async fn load(&self) -> Document {
        Document::default()
    }

    async fn save(&self, _doc: &Document) -> Result<(), StoreError> {
        Err(std::io::Error::new(std::io::ErrorKind::PermissionDenied, "read-only").into())
    }
}

#[tokio::test]
async fn failed_write_is_server_error() {
    let app = build_router(Arc::new(AppState::new(Arc::new(ReadOnlyStore))));
    let (status, body) = post(&app, "/api/auth/register", creds("alice", "p1")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(body["error"].as_str().unwrap().contains("read-only"));
}

#[tokio::test]
async fn file_store_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");

    let app = build_router(Arc::new(AppState::new(Arc::new(JsonFileStore::new(&path)))));
    post(&app, "/api/auth/register", creds("alice", "p1")).await;
    post(
        &app,
        "/api/crop/add",
        json!({ "name": "Wheat", "type": "Barter", "owner": "alice", "barterFor": "Corn" }),
    )
    .await;

    let restarted = build_router(Arc::new(AppState::new(Arc::new(JsonFileStore::new(&path)))));
    let (status, _) = post(&restarted, "/api/auth/login", creds("alice", "p1")).await;
    assert_eq!(status, StatusCode::OK);

    let (_, body) = post(
        &restarted,
        "/api/crop/add",
        json!({ "name": "Rice", "type": "Resell", "owner": "alice", "price": 10 }),
    )
    .await;
    assert_eq!(body["crop"]["id"], 2);

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["users"][0]["username"], "alice");
    assert_eq!(raw["crops"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn browser_era_database_is_kept() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("database.json");
    let legacy = json!({
        "users": [{ "username": "alice", "password": "p1" }],
        "crops": [
            { "id": 1, "name": "Wheat", "type": "resell", "owner": "alice",
              "barterFor": null, "price": 12 },
            { "id": 2, "name": "Rice", "type": "Resell", "owner": "alice",
              "barterFor": null, "price": "40" }
        ]
    });
    std::fs::write(&path, serde_json::to_string_pretty(&legacy).unwrap()).unwrap();

    let app = build_router(Arc::new(AppState::new(Arc::new(JsonFileStore::new(&path)))));
    let (status, _) = post(&app, "/api/auth/login", creds("alice", "p1")).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = post(&app, "/api/auth/register", creds("bob", "p2")).await;
    assert_eq!(status, StatusCode::OK);

    let raw: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(raw["users"].as_array().unwrap().len(), 2);
    assert_eq!(raw["crops"].as_array().unwrap().len(), 2);
    assert_eq!(raw["crops"][0]["type"], "Resell");
    assert_eq!(raw["crops"][1]["price"], 40.0);

    let (status, body) = get(&app, "/api/crop/resell/rice").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body[0]["id"], 2);
}

#[tokio::test]
async fn non_finite_price_is_rejected() {
    let app = test_app();
    for price in ["inf", "NaN", "-Infinity"] {
        let listing = json!({ "name": "Rice", "type": "Resell", "owner": "bob", "price": price });
        let (status, body) = post(&app, "/api/crop/add", listing).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].is_string());
    }

    let (_, all) = get(&app, "/api/crop/all").await;
    assert_eq!(all, json!([]));
}

#[tokio::test]
async fn concurrent_registrations_do_not_lose_users() {
    let app = test_app();
    let mut handles = Vec::new();
    for i in 0..20 {
        let app = app.clone();
        handles.push(tokio::spawn(async move {
            post(&app, "/api/auth/register", creds(&format!("user{i}"), "pw")).await
        }));
    }
    for h in handles {
        assert_eq!(h.await.unwrap().0, StatusCode::OK);
    }

    for i in 0..20 {
        let (status, _) = post(&app, "/api/auth/login", creds(&format!("user{i}"), "pw")).await;
        assert_eq!(status, StatusCode::OK);
    }
}
