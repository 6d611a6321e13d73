//! Defines routes for asset uploads and object downloads.
//!
//! ## Structure
//! - `PUT /assets/{*filename}` — upload a file (`?thumbnail=true&prefix=...`)
//! - `GET /objects/{*key}`     — download a stored object
//! - `GET /healthz`, `GET /readyz` — liveness and readiness
//!
//! The wildcard segments allow nested keys like `avatars/2025/<id>.jpg`.

use crate::{
    handlers::{
        asset_handlers::{get_object, upload_asset},
        health_handlers::{healthz, readyz},
    },
    state::AppState,
};
use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, put},
};

/// Build the router; upload bodies larger than `max_upload_bytes` are rejected.
pub fn routes(max_upload_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .route("/assets/{*filename}", put(upload_asset))
        .route("/objects/{*key}", get(get_object))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
}
