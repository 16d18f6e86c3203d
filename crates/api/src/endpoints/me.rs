//! Own-profile endpoints.

use alumni_common::AppResult;
use alumni_core::{MembershipCard, UpdateProfileInput};
use axum::{Json, Router, extract::State, routing::get};

use super::users::UserResponse;
use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(me).put(update_me))
        .route("/card", get(card))
}

async fn me(AuthUser(session): AuthUser) -> AppResult<ApiResponse<UserResponse>> {
    Ok(ApiResponse::ok(session.user.into()))
}

async fn update_me(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<UpdateProfileInput>,
) -> AppResult<ApiResponse<UserResponse>> {
    let user = state
        .user_service
        .update_profile(session.user_id(), req)
        .await?;

    Ok(ApiResponse::ok(user.into()))
}

/// Membership card data for printing.
async fn card(AuthUser(session): AuthUser) -> AppResult<ApiResponse<MembershipCard>> {
    Ok(ApiResponse::ok(MembershipCard::for_session(&session)))
}
