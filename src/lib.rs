//! Optica API Library
//!
//! Back office of an optical shop: orders with their customer details and
//! prescriptions, products built from the frame / glass / lens catalog, and
//! vouchers paying for orders in installments.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

// Core modules
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod middleware_helpers;
pub mod migrator;
pub mod openapi;
pub mod services;
pub mod tracing;
pub mod validation;

use axum::{routing::get, Router};
use chrono::Utc;
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone());
        Self {
            db,
            config,
            services,
        }
    }
}

// Common query parameters for list endpoints
#[derive(Debug, Deserialize, Serialize, IntoParams)]
pub struct ListQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    /// Page size; defaults to the configured page size, capped at the maximum
    pub limit: Option<u64>,
    pub search: Option<String>,
}

fn default_page() -> u64 {
    1
}

// Common response wrappers
#[derive(Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meta: Option<ResponseMeta>,
}

#[derive(Serialize, ToSchema)]
pub struct ResponseMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub timestamp: String,
}

impl ResponseMeta {
    fn capture() -> Self {
        Self {
            request_id: crate::tracing::current_request_id().map(|rid| rid.as_str().to_string()),
            timestamp: Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct PaginatedResponse<T> {
    pub items: Vec<T>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
    pub total_pages: u64,
}

impl<T> PaginatedResponse<T> {
    pub fn new(items: Vec<T>, total: u64, page: u64, limit: u64) -> Self {
        let total_pages = if limit == 0 {
            0
        } else {
            total.div_ceil(limit)
        };
        Self {
            items,
            total,
            page,
            limit,
            total_pages,
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            message: None,
            meta: Some(ResponseMeta::capture()),
        }
    }
}


/// Versioned JSON API
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/users", handlers::users::users_routes())
        // Orders with their per-order details and products
        .nest("/orders", handlers::orders::orders_routes())
        .nest("/identities", handlers::order_details::identities_routes())
        .nest("/contacts", handlers::order_details::contacts_routes())
        .nest("/institutions", handlers::order_details::institutions_routes())
        .nest("/prescriptions", handlers::order_details::prescriptions_routes())
        .nest("/products", handlers::products::products_routes())
        // Catalog
        .nest("/frames", handlers::catalog::frames_routes())
        .nest("/glass-types", handlers::catalog::glass_types_routes())
        .nest("/lenses", handlers::catalog::lenses_routes())
        // Payments
        .nest("/vouchers", handlers::vouchers::vouchers_routes())
        .nest("/tunnel", handlers::public::tunnel_routes())
}

/// Full application router: banner, health probes, the v1 API and Swagger UI,
/// with request ids and HTTP tracing. Transport concerns (CORS, compression,
/// timeouts, body limits) are layered on by the binary.
pub fn app_router(state: AppState) -> Router {
    let health = health::health_routes(state.db.clone());

    Router::<AppState>::new()
        .route("/", get(handlers::public::home))
        .nest("/api/v1", api_v1_routes())
        .merge(openapi::swagger_ui())
        .with_state(state)
        .nest("/health", health)
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id::request_id_middleware,
        ))
}
