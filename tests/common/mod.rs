#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use optica_api::{
    app_router,
    config::AppConfig,
    db::{self, DbConfig},
    AppState,
};
use tower::ServiceExt;

/// Catalog rows a product can reference.
#[derive(Debug, Clone, Copy)]
pub struct CatalogIds {
    pub frame_id: i32,
    pub glass_type_id: i32,
    pub lens_id: i32,
}

/// Helper harness for spinning up the application backed by a private
/// in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let pool = db::establish_connection_with_config(&DbConfig::in_memory())
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        let state = AppState::new(Arc::new(pool), cfg);
        let router = app_router(state.clone());

        Self { router, state }
    }

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
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }

    /// Sends a request and returns the status with the parsed JSON body
    /// (`Value::Null` for empty bodies).
    pub async fn json(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let response = self.request(method, uri, body).await;
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("read response body");
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).expect("parse response body")
        };
        (status, value)
    }

    /// POSTs and returns `data` of the success envelope, asserting 201.
    pub async fn create(&self, uri: &str, body: Value) -> Value {
        let (status, payload) = self.json(Method::POST, uri, Some(body)).await;
        assert_eq!(status, StatusCode::CREATED, "POST {uri} failed: {payload}");
        payload["data"].clone()
    }

    pub async fn get_data(&self, uri: &str) -> Value {
        let (status, payload) = self.json(Method::GET, uri, None).await;
        assert_eq!(status, StatusCode::OK, "GET {uri} failed: {payload}");
        payload["data"].clone()
    }

    pub async fn seed_user(&self, username: &str) -> i32 {
        let user = self
            .create("/api/v1/users", json!({ "username": username }))
            .await;
        id_of(&user)
    }

    pub async fn seed_order(&self, user_id: i32) -> i32 {
        let order = self
            .create("/api/v1/orders", json!({ "user_id": user_id }))
            .await;
        id_of(&order)
    }

    pub async fn seed_catalog(&self) -> CatalogIds {
        let frame = self
            .create("/api/v1/frames", json!({ "title": "Ray-Ban Aviator" }))
            .await;
        let glass_type = self
            .create(
                "/api/v1/glass-types",
                json!({ "distance": "FAR", "treatment": "POLARIZED" }),
            )
            .await;
        let lens = self
            .create("/api/v1/lenses", json!({ "title": "Single vision 1.6 index" }))
            .await;
        CatalogIds {
            frame_id: id_of(&frame),
            glass_type_id: id_of(&glass_type),
            lens_id: id_of(&lens),
        }
    }

    pub async fn seed_product(&self, order_id: i32, catalog: CatalogIds, price: Decimal) -> i32 {
        let product = self
            .create(
                &format!("/api/v1/orders/{order_id}/products"),
                json!({
                    "frame_id": catalog.frame_id,
                    "glass_type_id": catalog.glass_type_id,
                    "lens_id": catalog.lens_id,
                    "price": price.to_string(),
                }),
            )
            .await;
        id_of(&product)
    }
}

pub fn id_of(value: &Value) -> i32 {
    value["id"]
        .as_i64()
        .and_then(|id| i32::try_from(id).ok())
        .expect("record id")
}
