pub mod activity_logs;
pub mod announcements;
pub mod auth;
pub mod payments;
pub mod root;
pub mod students;
pub mod types;

use std::net::SocketAddr;

use axum::http::{header, HeaderMap};

use crate::service::RequestMeta;

/// Client address and user agent, captured for audit entries.
pub(crate) fn request_meta(addr: SocketAddr, headers: &HeaderMap) -> RequestMeta {
    RequestMeta {
        ip: Some(addr.ip().to_string()),
        user_agent: headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
    }
}
