#![allow(dead_code)]

use std::str::FromStr;

use axum::{
    body::{self, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use katha_api::{app_router, config::AppConfig, db, AppState};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

/// Helper harness for spinning up the full router over a fresh SQLite file.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _dir: TempDir,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let db_file = dir.path().join("katha_test.db");

        let mut cfg = AppConfig::new(
            format!("sqlite://{}?mode=rwc", db_file.display()),
            "127.0.0.1".to_string(),
            4000,
            "test".to_string(),
        );
        cfg.db_max_connections = 2;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let state = AppState::new(std::sync::Arc::new(pool), cfg);
        Self {
            router: app_router(state.clone()),
            state,
            _dir: dir,
        }
    }

    /// Send a request against the router.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
    ) -> axum::response::Response {
        let mut builder = Request::builder().method(method).uri(uri);

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.send(request).await
    }

    /// Send a prepared request, e.g. one carrying extra headers.
    pub async fn send(&self, request: Request<Body>) -> axum::response::Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the parsed body
    /// (`Value::Null` for empty bodies).
    pub async fn call(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        (status, response_json(response).await)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, Some(body)).await
    }

    pub async fn put(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.call(Method::PUT, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.call(Method::DELETE, uri, None).await
    }

    /// Creates a group and returns its id.
    pub async fn create_group(&self, number: i32, name: &str) -> i64 {
        let (status, body) = self
            .post(
                "/api/groups",
                json!({ "group_number": number, "group_name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create group: {body}");
        body["id"].as_i64().expect("group id")
    }

    /// Creates a category with an automatically assigned number.
    pub async fn create_category(&self, group_id: i64, name: &str) -> Value {
        let (status, body) = self
            .post(
                "/api/categories",
                json!({ "group_id": group_id, "category_name": name }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create category: {body}");
        body
    }

    /// Creates an item with the given opening stock and returns its id.
    pub async fn create_item(&self, category_id: i64, code: &str, mrp: &str, stock: i32) -> i64 {
        let (status, body) = self
            .post(
                "/api/items",
                json!({
                    "item_code": code,
                    "item_name": format!("Item {code}"),
                    "category_id": category_id,
                    "mrp": mrp,
                    "gst_percentage": "5",
                    "opening_stock": stock,
                    "reorder_level": 2
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "create item: {body}");
        body["id"].as_i64().expect("item id")
    }

    /// Current stock of an item as reported by the API.
    pub async fn stock_of(&self, item_id: i64) -> i64 {
        let (status, body) = self.get(&format!("/api/items/{item_id}")).await;
        assert_eq!(status, StatusCode::OK);
        body["current_stock"].as_i64().expect("current stock")
    }

    /// One group, one category and one item, returning the item id.
    pub async fn seed_item(&self, code: &str, mrp: &str, stock: i32) -> i64 {
        let group_id = self.create_group(1, "Stationery").await;
        let category = self.create_category(group_id, "Notebooks").await;
        self.create_item(category["id"].as_i64().expect("category id"), code, mrp, stock)
            .await
    }
}

pub async fn response_json(response: axum::response::Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    if bytes.is_empty() {
        return Value::Null;
    }
    // Extractor rejections answer in plain text
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Reads a decimal that may be serialized as a string or a number.
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => Decimal::from_str(s).expect("decimal string"),
        Value::Number(n) => Decimal::from_str(&n.to_string()).expect("decimal number"),
        other => panic!("expected decimal, got {other}"),
    }
}
