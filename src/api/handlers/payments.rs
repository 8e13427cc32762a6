use std::net::SocketAddr;

use axum::{
    extract::{ConnectInfo, State},
    http::HeaderMap,
    Extension, Json,
};
use serde::Serialize;
use validator::Validate;

use crate::{
    api::{
        handlers::{
            request_meta,
            types::{success, success_with_message, Envelope},
        },
        middleware::auth::CurrentUser,
        state::AppState,
    },
    domain::{Payment, PaymentApprovalRequest},
    error::Result,
};

pub async fn request_approval(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<PaymentApprovalRequest>,
) -> Result<Json<Envelope<Payment>>> {
    request.validate()?;

    let meta = request_meta(addr, &headers);
    let payment = state
        .service_context
        .payment_service
        .request_approval(&user.student, request, meta)
        .await?;

    Ok(Json(success_with_message("Request sent successfully", payment)))
}

#[derive(Debug, Serialize)]
pub struct PaymentsData {
    pub payments: Vec<Payment>,
}

pub async fn history(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> Result<Json<Envelope<PaymentsData>>> {
    let payments = state
        .service_context
        .payment_service
        .history(user.student.id)
        .await?;

    Ok(Json(success(PaymentsData { payments })))
}
