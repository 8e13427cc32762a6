use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        handlers::types::{success, success_with_message, Envelope},
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{
        Announcement, AnnouncementPage, AnnouncementQuery, AnnouncementStats,
        CreateAnnouncementRequest, UpdateAnnouncementRequest,
    },
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(query): Query<AnnouncementQuery>,
) -> Result<Json<Envelope<AnnouncementPage>>> {
    let page = state
        .service_context
        .announcement_service
        .list(&user.student, query)
        .await?;

    Ok(Json(success(page)))
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub limit: Option<i64>,
}

pub async fn dashboard(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<Envelope<Vec<Announcement>>>> {
    let limit = params.limit.unwrap_or(10).clamp(1, 100);
    let announcements = state
        .service_context
        .announcement_service
        .dashboard(&user.student, limit)
        .await?;

    Ok(Json(success(announcements)))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<Json<Envelope<AnnouncementStats>>> {
    let stats = state.service_context.announcement_service.stats().await?;

    Ok(Json(success(stats)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetParams {
    pub increment_view: Option<bool>,
}

/// Serves both the members' route and the public one; soft-deleted records
/// remain reachable here by design.
pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(params): Query<GetParams>,
) -> Result<Json<Envelope<Announcement>>> {
    let announcement = state
        .service_context
        .announcement_service
        .get(id, params.increment_view.unwrap_or(false))
        .await?;

    Ok(Json(success(announcement)))
}

#[derive(Debug, Deserialize)]
pub struct RecentParams {
    pub limit: Option<i64>,
}

pub async fn recent(
    State(state): State<AppState>,
    Query(params): Query<RecentParams>,
) -> Result<Json<Envelope<Vec<Announcement>>>> {
    let limit = params.limit.unwrap_or(5).clamp(1, 100);
    let announcements = state
        .service_context
        .announcement_service
        .recent(limit)
        .await?;

    Ok(Json(success(announcements)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Json(request): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Envelope<Announcement>>)> {
    request.validate()?;

    let announcement = state
        .service_context
        .announcement_service
        .create(&user.student, request)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(success_with_message(
            "Announcement created successfully",
            announcement,
        )),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateAnnouncementRequest>,
) -> Result<Json<Envelope<Announcement>>> {
    request.validate()?;

    let announcement = state
        .service_context
        .announcement_service
        .update(&user.student, id, request)
        .await?;

    Ok(Json(success_with_message(
        "Announcement updated successfully",
        announcement,
    )))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<Announcement>>> {
    let announcement = state
        .service_context
        .announcement_service
        .delete(&user.student, id)
        .await?;

    Ok(Json(success_with_message(
        "Announcement deleted successfully",
        announcement,
    )))
}
