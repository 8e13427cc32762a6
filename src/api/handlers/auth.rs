use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Path, State},
    http::{HeaderMap, StatusCode},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
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
    domain::{RegisterRequest, Student, StudentDetail},
    error::Result,
};

#[derive(Debug, Serialize)]
pub struct StudentData {
    pub student: Student,
}

pub async fn register(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(mut request): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Envelope<StudentData>>)> {
    request.normalize();
    request.validate()?;

    let meta = request_meta(addr, &headers);
    let student = state
        .service_context
        .auth_service
        .register(request, meta)
        .await?;

    Ok((StatusCode::CREATED, Json(success(StudentData { student }))))
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub token: String,
    pub data: StudentData,
}

pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    request.validate()?;

    let email = request.email.trim().to_lowercase();
    let (student, token) = state
        .service_context
        .auth_service
        .login(&email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        status: "success",
        token,
        data: StudentData { student },
    }))
}

#[derive(Debug, Serialize)]
pub struct MeData {
    pub me: StudentDetail,
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<MeData>>> {
    let me = state
        .service_context
        .student_service
        .get_with_history(user.student.id)
        .await?;

    Ok(Json(success(MeData { me })))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ForgotPasswordRequest {
    #[validate(email(message = "Please provide an email address"))]
    pub email: String,
}

pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    let email = request.email.trim().to_lowercase();
    state
        .service_context
        .auth_service
        .forgot_password(&email)
        .await?;

    Ok(Json(message("Token sent to email")))
}

#[derive(Debug, Deserialize, Validate)]
pub struct ResetPasswordRequest {
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(request): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>> {
    request.validate()?;

    state
        .service_context
        .auth_service
        .reset_password(&token, &request.password)
        .await?;

    Ok(Json(message("Password reset successfully")))
}
