//! Katha API Library
//!
//! Sales, inventory and school administration backend over SQLite. Items are
//! filed under numbered groups and categories; see [`numbering`] for how a
//! category number is derived from its group.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod middleware_helpers;
pub mod numbering;
pub mod openapi;
pub mod services;
pub mod tracing;

use axum::{routing::get, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use handlers::{
    cash_sales::cash_sale_routes, categories::category_routes,
    categories::next_category_number, cities::city_routes, groups::group_routes,
    health::health_routes, items::item_routes, purchases::purchase_routes,
    reports::report_routes, teachers::teacher_routes,
};

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: config::AppConfig,
    pub services: handlers::AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, config: config::AppConfig) -> Self {
        let services = handlers::AppServices::new(db.clone(), &config);
        Self {
            db,
            config,
            services,
        }
    }
}

/// Routes served under `/api`
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/groups", group_routes())
        .nest("/categories", category_routes())
        .route("/categories-next-number", get(next_category_number))
        .nest("/items", item_routes())
        .nest("/purchases", purchase_routes())
        .nest("/cashsales", cash_sale_routes())
        .nest("/reports", report_routes())
        .nest("/cities", city_routes())
        .nest("/teachers", teacher_routes())
}

/// Full application router with health, docs, tracing and request ids.
///
/// Transport layers that depend on deployment (CORS, compression, timeouts)
/// are added by the server binary.
pub fn app_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", api_routes())
        .nest("/health", health_routes())
        .merge(openapi::swagger_ui())
        .layer(crate::tracing::configure_http_tracing())
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}
