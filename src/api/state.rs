use std::sync::Arc;

use crate::{
    api::middleware::rate_limit::ApiRateLimiter,
    config::Settings,
    service::ServiceContext,
};

#[derive(Clone)]
pub struct AppState {
    pub service_context: Arc<ServiceContext>,
    pub settings: Arc<Settings>,
    pub rate_limiter: Arc<ApiRateLimiter>,
}

impl AppState {
    pub fn new(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Self {
        let rate_limiter = Arc::new(ApiRateLimiter::new(
            settings.rate_limit.max_requests,
            settings.rate_limit.window_secs,
        ));

        Self {
            service_context,
            settings,
            rate_limiter,
        }
    }
}
