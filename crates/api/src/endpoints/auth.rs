//! Authentication endpoints.

use alumni_common::AppResult;
use alumni_core::{CreateUserInput, Session};
use axum::{Json, Router, extract::State, routing::post};
use serde::{Deserialize, Serialize};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Login request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub nni: String,
    pub password: String,
}

/// Token plus the member it belongs to.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthResponse {
    pub token: String,
    pub user: UserResponse,
}

impl From<Session> for AuthResponse {
    fn from(session: Session) -> Self {
        Self {
            token: session.token,
            user: session.user.into(),
        }
    }
}

/// Register a new member and sign them in.
async fn register(
    State(state): State<AppState>,
    Json(req): Json<CreateUserInput>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let user = state.user_service.register(req).await?;
    let session = state.session_service.issue(user).await?;

    Ok(ApiResponse::created(session.into()))
}

/// Sign in with nni and password.
async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> AppResult<ApiResponse<AuthResponse>> {
    let session = state
        .session_service
        .login(req.nni.trim(), &req.password)
        .await?;

    Ok(ApiResponse::ok(session.into()))
}

/// Sign out (revoke the current token).
async fn logout(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<()>> {
    state.session_service.logout(&session).await?;

    Ok(ApiResponse::ok(()))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/auth", post(login))
        .route("/logout", post(logout))
}
