use std::net::{IpAddr, SocketAddr};
use std::num::NonZeroU32;
use std::time::Duration;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use governor::{
    clock::DefaultClock, state::keyed::DefaultKeyedStateStore, Quota, RateLimiter,
};

use crate::{
    api::state::AppState,
    error::{AppError, Result},
};

/// Per-client-IP throttle for the `/api` surface. The quota spreads
/// `max_requests` over the window with the full amount available as burst,
/// allowing the same total as a fixed window of that size.
pub struct ApiRateLimiter {
    limiter: RateLimiter<IpAddr, DefaultKeyedStateStore<IpAddr>, DefaultClock>,
}

impl ApiRateLimiter {
    pub fn new(max_requests: u32, window_secs: u64) -> Self {
        let max = NonZeroU32::new(max_requests.max(1)).expect("max_requests is non-zero");
        let quota = Quota::with_period(Duration::from_secs(window_secs.max(1)) / max.get())
            .expect("rate-limit period is non-zero")
            .allow_burst(max);

        Self {
            limiter: RateLimiter::keyed(quota),
        }
    }

    pub fn check(&self, ip: IpAddr) -> bool {
        self.limiter.check_key(&ip).is_ok()
    }
}

pub async fn rate_limit(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    request: Request,
    next: Next,
) -> Result<Response> {
    if !state.rate_limiter.check(addr.ip()) {
        return Err(AppError::TooManyRequests(
            "Too many requests from this IP, please try again later.".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
