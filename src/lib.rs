//! Time-off requests, manager approvals and the team calendar.
//!
//! The binary in `main.rs` only wires configuration, logging and the HTTP
//! server; everything else lives here so integration tests can build the
//! same application.

use actix_web::web;
use tracing::debug;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod api;
pub mod auth;
pub mod config;
pub mod dashboard;
pub mod db;
pub mod docs;
pub mod error;
pub mod model;
pub mod models;
pub mod routes;
pub mod service;
pub mod utils;

pub use service::AppState;

use crate::api::requests::INVALID_PAYLOAD;
use crate::docs::ApiDoc;
use crate::error::AppError;

/// JSON bodies that fail to deserialize answer with the standard error body.
pub fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected JSON payload");
        AppError::Validation(INVALID_PAYLOAD.into()).into()
    })
}

pub const INVALID_QUERY: &str = "Invalid query parameters.";

/// Query strings that fail to deserialize answer with the standard error body.
pub fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| {
        debug!(error = %err, "Rejected query string");
        AppError::Validation(INVALID_QUERY.into()).into()
    })
}

/// Register state, docs and every route on an actix `App`.
pub fn configure_app(cfg: &mut web::ServiceConfig, state: AppState) {
    let config = state.config.clone();
    cfg.app_data(web::Data::new(state))
        .app_data(json_config())
        .app_data(query_config())
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard so JS/CSS assets resolve
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        );
    routes::configure(cfg, &config);
}
