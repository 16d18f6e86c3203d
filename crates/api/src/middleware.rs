//! API middleware.

#![allow(missing_docs)]

use std::sync::Arc;

use alumni_common::Config;
use alumni_core::{ActivityService, SessionService, UserService, VotingService};
use alumni_db::repositories::{
    ActivityRepository, UserRepository, VoteOptionRepository, VoteRepository,
};
use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use sea_orm::DatabaseConnection;

/// Application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub session_service: SessionService,
    pub voting_service: VotingService,
    pub activity_service: ActivityService,
}

impl AppState {
    /// Wire repositories and services over one connection pool.
    #[must_use]
    pub fn new(db: Arc<DatabaseConnection>, config: &Config) -> Self {
        let user_repo = UserRepository::new(Arc::clone(&db));

        Self {
            user_service: UserService::new(user_repo.clone()),
            session_service: SessionService::new(user_repo, config),
            voting_service: VotingService::new(
                VoteOptionRepository::new(Arc::clone(&db)),
                VoteRepository::new(Arc::clone(&db)),
            ),
            activity_service: ActivityService::new(ActivityRepository::new(db)),
        }
    }
}

fn bearer_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(|token| token.trim().to_string())
        .filter(|token| !token.is_empty())
}

/// Authentication middleware.
///
/// Inserts the caller's [`alumni_core::Session`] into the request extensions.
/// Unknown and expired tokens leave the request anonymous.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if let Some(token) = bearer_token(req.headers()) {
        match state.session_service.resolve(&token).await {
            Ok(Some(session)) => {
                req.extensions_mut().insert(session);
            }
            Ok(None) => {}
            Err(e) => return e.into_response(),
        }
    }

    next.run(req).await
}
