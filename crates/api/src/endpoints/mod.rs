//! API endpoints.

mod activities;
mod auth;
mod me;
mod users;
mod vote;

use axum::Router;

use crate::middleware::AppState;

pub use users::UserResponse;

/// Create the API router.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .nest("/me", me::router())
        .nest("/users", users::router())
        .nest("/vote", vote::router())
        .nest("/activities", activities::router())
}
