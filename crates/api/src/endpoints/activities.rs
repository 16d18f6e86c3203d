//! Activity board endpoints.

use alumni_common::AppResult;
use alumni_core::{
    Action, ActivityPage, ActivitySort, CreateActivityInput, ListActivitiesInput,
    UpdateActivityInput, authorize,
};
use alumni_db::entities::activity;
use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::{extractors::AuthUser, middleware::AppState, response::ApiResponse};

/// Create activity router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_activities).post(create_activity))
        .route(
            "/{id}",
            get(get_activity)
                .put(update_activity)
                .delete(delete_activity),
        )
}

/// Activity response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityResponse {
    pub id: String,
    pub title: String,
    pub description: String,
    /// `YYYY-MM-DD`
    pub date: NaiveDate,
    pub image_url: Option<String>,
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<activity::Model> for ActivityResponse {
    fn from(activity: activity::Model) -> Self {
        Self {
            id: activity.id,
            title: activity.title,
            description: activity.description,
            date: activity.date,
            image_url: activity.image_url,
            created_by: activity.created_by,
            created_at: activity.created_at,
            updated_at: activity.updated_at,
        }
    }
}

/// One page of the board.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityPageResponse {
    pub items: Vec<ActivityResponse>,
    pub page: u64,
    pub page_size: u64,
    pub total: u64,
    pub total_pages: u64,
}

impl From<ActivityPage> for ActivityPageResponse {
    fn from(page: ActivityPage) -> Self {
        Self {
            items: page.items.into_iter().map(ActivityResponse::from).collect(),
            page: page.page,
            page_size: page.page_size,
            total: page.total,
            total_pages: page.total_pages,
        }
    }
}

/// List activities query.
#[derive(Debug, Deserialize)]
pub struct ListActivitiesQuery {
    pub q: Option<String>,
    /// `date_desc` (default), `date_asc` or `title`.
    pub sort: Option<String>,
    #[serde(default = "default_page")]
    pub page: u64,
}

const fn default_page() -> u64 {
    1
}

async fn list_activities(
    State(state): State<AppState>,
    Query(query): Query<ListActivitiesQuery>,
) -> AppResult<ApiResponse<ActivityPageResponse>> {
    let sort = match query.sort.as_deref() {
        Some(sort) if !sort.is_empty() => sort.parse::<ActivitySort>()?,
        _ => ActivitySort::default(),
    };

    let page = state
        .activity_service
        .list(ListActivitiesInput {
            query: query.q,
            sort,
            page: query.page,
        })
        .await?;

    Ok(ApiResponse::ok(page.into()))
}

async fn get_activity(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    let activity = state.activity_service.get(&id).await?;
    Ok(ApiResponse::ok(activity.into()))
}

async fn create_activity(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Json(req): Json<CreateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    authorize(&session, Action::ManageActivities).into_result()?;

    let activity = state
        .activity_service
        .create(session.user_id(), req)
        .await?;

    Ok(ApiResponse::created(activity.into()))
}

async fn update_activity(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateActivityInput>,
) -> AppResult<ApiResponse<ActivityResponse>> {
    authorize(&session, Action::ManageActivities).into_result()?;

    let activity = state.activity_service.update(&id, req).await?;
    Ok(ApiResponse::ok(activity.into()))
}

async fn delete_activity(
    AuthUser(session): AuthUser,
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<()>> {
    authorize(&session, Action::ManageActivities).into_result()?;

    state.activity_service.delete(&id).await?;
    Ok(ApiResponse::ok(()))
}
