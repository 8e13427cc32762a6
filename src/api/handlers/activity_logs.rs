use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, Query, State},
    http::HeaderMap,
    Extension, Json,
};

use crate::{
    api::{
        handlers::{
            request_meta,
            types::{success, success_with_message, Envelope},
        },
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{ActivityLogPage, ActivityLogQuery, ClearLogsResult},
    error::Result,
};

pub async fn list(
    State(state): State<AppState>,
    Extension(_user): Extension<CurrentUser>,
    Query(query): Query<ActivityLogQuery>,
) -> Result<Json<Envelope<ActivityLogPage>>> {
    let page = state
        .service_context
        .activity_log_service
        .list(&query)
        .await?;

    Ok(Json(success(page)))
}

pub async fn clear(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> Result<Json<Envelope<ClearLogsResult>>> {
    let meta = request_meta(addr, &headers);
    let result = state
        .service_context
        .activity_log_service
        .clear_old(&user.student, meta)
        .await?;

    Ok(Json(success_with_message(result.message.clone(), result)))
}
