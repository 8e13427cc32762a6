use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::{
    api::state::AppState,
    domain::Student,
    error::{AppError, Result},
};

/// The authenticated student, resolved fresh from the database on every
/// protected request so a deleted account is locked out immediately.
#[derive(Clone)]
pub struct CurrentUser {
    pub student: Student,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request)?;
    let student = authenticate(&state, &token).await?;

    request.extensions_mut().insert(CurrentUser { student });

    Ok(next.run(request).await)
}

pub async fn require_admin(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response> {
    let token = bearer_token(&request)?;
    let student = authenticate(&state, &token).await?;

    if !student.is_admin() {
        return Err(AppError::Forbidden(
            "You do not have permission to perform this action.".to_string(),
        ));
    }

    request.extensions_mut().insert(CurrentUser { student });

    Ok(next.run(request).await)
}

/// Extracts the bearer token from the `Authorization` header. Kept separate
/// (and non-async) so that no borrow of the `Request` is held across the
/// database await in [`authenticate`], which would make the middleware future
/// `!Send`.
fn bearer_token(request: &Request) -> Result<String> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok());

    match header_value {
        Some(value) if value.starts_with("Bearer ") => Ok(value[7..].to_string()),
        _ => Err(AppError::Unauthorized(
            "You are not logged in. Please log in to get access.".to_string(),
        )),
    }
}

async fn authenticate(state: &AppState, token: &str) -> Result<Student> {
    let student_id = state.service_context.jwt.verify(token)?;

    state
        .service_context
        .student_repo
        .find_by_id(student_id)
        .await?
        .ok_or_else(|| {
            AppError::Unauthorized(
                "The user belonging to this token no longer exists.".to_string(),
            )
        })
}
