//! Voting endpoints.

use alumni_common::AppResult;
use alumni_core::{Action, VoteResults, authorize};
use alumni_db::entities::{vote, vote_option};
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{delete, get, post},
};
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create vote router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(cast_vote))
        .route("/me", get(my_vote))
        .route("/results", get(results))
        .route("/choices", get(list_choices).post(add_choice))
        .route("/choices/{id}", delete(delete_choice))
}

/// Vote option response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceResponse {
    pub id: String,
    pub label: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<vote_option::Model> for ChoiceResponse {
    fn from(option: vote_option::Model) -> Self {
        Self {
            id: option.id,
            label: option.label,
            created_at: option.created_at,
        }
    }
}

/// Recorded ballot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub choice: String,
    pub created_at: DateTime<FixedOffset>,
}

impl From<vote::Model> for VoteResponse {
    fn from(vote: vote::Model) -> Self {
        Self {
            choice: vote.choice,
            created_at: vote.created_at,
        }
    }
}

/// Whether the caller has voted, and for what.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MyVoteResponse {
    pub has_voted: bool,
    pub choice: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CastVoteRequest {
    pub choice: String,
}

#[derive(Debug, Deserialize)]
pub struct AddChoiceRequest {
    pub label: String,
}

async fn cast_vote(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CastVoteRequest>,
) -> AppResult<ApiResponse<VoteResponse>> {
    authorize(&session, Action::CastVote).into_result()?;

    let vote = state
        .voting_service
        .cast_vote(session.user_id(), &req.choice)
        .await?;

    Ok(ApiResponse::created(vote.into()))
}

async fn my_vote(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<MyVoteResponse>> {
    let choice = state.voting_service.my_vote(session.user_id()).await?;

    Ok(ApiResponse::ok(MyVoteResponse {
        has_voted: choice.is_some(),
        choice,
    }))
}

async fn results(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<VoteResults>> {
    authorize(&session, Action::ViewVoteResults).into_result()?;

    Ok(ApiResponse::ok(state.voting_service.results().await?))
}

async fn list_choices(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
) -> AppResult<ApiResponse<Vec<ChoiceResponse>>> {
    authorize(&session, Action::CastVote).into_result()?;

    let choices = state.voting_service.choices().await?;
    Ok(ApiResponse::ok(
        choices.into_iter().map(ChoiceResponse::from).collect(),
    ))
}

async fn add_choice(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<AddChoiceRequest>,
) -> AppResult<ApiResponse<ChoiceResponse>> {
    authorize(&session, Action::ManageVoteOptions).into_result()?;

    info!(user_id = %session.user_id(), label = %req.label, "Adding vote option");

    let option = state.voting_service.add_choice(&req.label).await?;
    Ok(ApiResponse::created(option.into()))
}

async fn delete_choice(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    authorize(&session, Action::ManageVoteOptions).into_result()?;

    state.voting_service.delete_choice(&id).await?;
    Ok(ApiResponse::ok(()))
}
