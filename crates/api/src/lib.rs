//! HTTP API layer for alumni-rs.
//!
//! - **Endpoints**: auth, profile, member directory, voting, activity board
//! - **Extractors**: resolved [`alumni_core::Session`] of the caller
//! - **Middleware**: bearer-token session resolution
//!
//! Built on Axum 0.8.

pub mod endpoints;
pub mod extractors;
pub mod middleware;
pub mod response;

use axum::{Json, Router, middleware::from_fn_with_state, routing::get};
use serde_json::{Value, json};

pub use endpoints::router;
pub use middleware::AppState;

/// Full application: `/api` routes behind session resolution, plus `/health`.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .nest("/api", router())
        .layer(from_fn_with_state(state.clone(), middleware::auth_middleware))
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
