pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod handlers;
pub mod jobs;
pub mod mailer;
pub mod message_queue;
pub mod scheduler;
pub mod services;

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::{config::AppConfig, db::DbPool, handlers::AppServices, message_queue::MessageQueue};

/// Shared application state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DbPool>,
    pub config: AppConfig,
    pub services: AppServices,
    pub queue: Arc<dyn MessageQueue>,
}

/// Routes under `/api/v1`, all behind authentication.
pub fn api_v1_routes() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/suppliers", handlers::suppliers::supplier_routes())
        .nest("/products", handlers::products::product_routes())
        .nest("/admin", handlers::admin::admin_routes())
        .route("/statistics", get(handlers::suppliers::debt_statistics))
        .route("/generate-qr", post(handlers::qr::generate_qr))
}
