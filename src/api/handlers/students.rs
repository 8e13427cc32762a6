use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, Query, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::Serialize;
use uuid::Uuid;
use validator::Validate;

use crate::{
    api::{
        handlers::{
            request_meta,
            types::{message, success, Envelope, MessageResponse},
        },
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{
        CreateStudentRequest, Student, StudentDetail, StudentPage, StudentQuery, StudentStats,
        UpdateStudentRequest,
    },
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct StudentData {
    pub student: Student,
}

#[derive(Debug, Serialize)]
pub struct StudentDetailData {
    pub student: StudentDetail,
}

pub async fn list(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Query(query): Query<StudentQuery>,
) -> Result<Json<Envelope<StudentPage>>> {
    let page = state.service_context.student_service.list(&query).await?;

    Ok(Json(success(page)))
}

pub async fn create(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Json(mut request): Json<CreateStudentRequest>,
) -> Result<(StatusCode, Json<Envelope<StudentData>>)> {
    request.normalize();
    request.validate()?;

    let student = state.service_context.student_service.create(request).await?;

    Ok((StatusCode::CREATED, Json(success(StudentData { student }))))
}

pub async fn get(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<Envelope<StudentDetailData>>> {
    let student = state
        .service_context
        .student_service
        .get_with_history(id)
        .await?;

    Ok(Json(success(StudentDetailData { student })))
}

pub async fn update(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateStudentRequest>,
) -> Result<Json<Envelope<StudentData>>> {
    request.validate()?;

    let meta = request_meta(addr, &headers);
    let student = state
        .service_context
        .student_service
        .update(id, request, meta)
        .await?;

    Ok(Json(success(StudentData { student })))
}

pub async fn delete(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Path(id): Path<Uuid>,
) -> Result<Json<MessageResponse>> {
    state.service_context.student_service.delete(id).await?;

    Ok(Json(message("Student deleted successfully")))
}

pub async fn stats(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
) -> Result<Json<Envelope<StudentStats>>> {
    let stats = state.service_context.student_service.stats().await?;

    Ok(Json(success(stats)))
}
