//! Member directory endpoints (admin).

use alumni_common::AppResult;
use alumni_core::{Action, CreateUserInput, UpdateUserInput, authorize};
use alumni_db::entities::{Role, user};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create users router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/{id}", get(get_user).put(update_user).delete(delete_user))
        .route("/{id}/block", post(block_user))
        .route("/{id}/unblock", post(unblock_user))
}

/// Client-facing member shape. Never carries the password hash or token.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: String,
    pub nni: String,
    pub name: String,
    pub role: Role,
    pub address: Option<String>,
    pub job: Option<String>,
    pub domain: Option<String>,
    pub cv: Option<String>,
    pub photo_url: Option<String>,
    pub is_blocked: bool,
    pub created_at: DateTime<FixedOffset>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

impl From<user::Model> for UserResponse {
    fn from(user: user::Model) -> Self {
        Self {
            id: user.id,
            nni: user.nni,
            name: user.name,
            role: user.role,
            address: user.address,
            job: user.job,
            domain: user.domain,
            cv: user.cv,
            photo_url: user.photo_url,
            is_blocked: user.is_blocked,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

async fn list_users(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<UserResponse>>> {
    authorize(&session, Action::ViewMembers).into_result()?;

    let users = state.user_service.list().await?;
    Ok(ApiResponse::ok(
        users.into_iter().map(UserResponse::from).collect(),
    ))
}

async fn get_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    authorize(&session, Action::ViewMembers).into_result()?;

    let user = state.user_service.get(&id).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn create_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    authorize(&session, Action::ManageUsers).into_result()?;

    let user = state.user_service.create(req).await?;
    Ok(ApiResponse::created(user.into()))
}

async fn update_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateUserInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    authorize(&session, Action::ManageUsers).into_result()?;

    let user = state.user_service.update(&id, req).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn delete_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    authorize(&session, Action::ManageUsers).into_result()?;

    state.user_service.delete(&id).await?;
    Ok(ApiResponse::ok(()))
}

async fn block_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    authorize(&session, Action::ManageUsers).into_result()?;

    let user = state.user_service.set_blocked(&id, true).await?;
    Ok(ApiResponse::ok(user.into()))
}

async fn unblock_user(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<UserResponse>> {
    authorize(&session, Action::ManageUsers).into_result()?;

    let user = state.user_service.set_blocked(&id, false).await?;
    Ok(ApiResponse::ok(user.into()))
}
