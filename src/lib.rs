//src/lib.rs

use axum::{
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod services;

use crate::config::AppState;

/// Monta o router HTTP com todas as rotas da API.
pub fn router(app_state: AppState) -> Router {
    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/users", post(handlers::users::register_user))
        .route("/api/imports", post(handlers::imports::run_import))
        .route("/api/invoices", post(handlers::invoices::submit_invoice))
        .route("/api/invoices/{access_key}", get(handlers::invoices::get_invoice))
        .with_state(app_state)
}
