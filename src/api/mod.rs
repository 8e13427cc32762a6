pub mod handlers;
pub mod middleware;
pub mod state;

use std::sync::Arc;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{delete, get, patch, post, put},
    Router,
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer, trace::TraceLayer};

use crate::{config::Settings, service::ServiceContext};
use state::AppState;

pub fn create_app(service_context: Arc<ServiceContext>, settings: Arc<Settings>) -> Router {
    let app_state = AppState::new(service_context, settings.clone());

    let cors = CorsLayer::new()
        .allow_origin(
            settings
                .server
                .client_url
                .parse::<HeaderValue>()
                .expect("server.client_url is a valid origin"),
        )
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION, header::ACCEPT]);

    Router::new()
        // Root and health endpoints
        .route("/", get(handlers::root::root))
        .route("/health", get(handlers::root::health_check))
        // API routes
        .nest("/api", api_routes(app_state.clone()))
        // Add state to the router
        .with_state(app_state)
        // Middleware
        .layer(CompressionLayer::new())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
}

fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes(state.clone()))
        .nest("/students", student_routes(state.clone()))
        .nest("/payments", payment_routes(state.clone()))
        .nest("/announcements", announcement_routes(state.clone()))
        .nest("/activityRoutes", activity_log_routes(state.clone()))
        .layer(axum::middleware::from_fn_with_state(
            state,
            middleware::rate_limit::rate_limit,
        ))
}

fn auth_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route("/forgotPassword", post(handlers::auth::forgot_password))
        .route("/resetPassword/:token", patch(handlers::auth::reset_password))
        .merge(
            Router::new()
                .route("/getMe", get(handlers::auth::get_me))
                .route_layer(axum::middleware::from_fn_with_state(
                    state,
                    middleware::auth::require_auth,
                )),
        )
}

fn student_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::students::list))
        .route("/", post(handlers::students::create))
        .route("/stats", get(handlers::students::stats))
        .route("/:id", get(handlers::students::get))
        .route("/:id", patch(handlers::students::update))
        .route("/:id", delete(handlers::students::delete))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}

fn payment_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/request-approval", post(handlers::payments::request_approval))
        .route("/history", get(handlers::payments::history))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_auth,
        ))
}

fn announcement_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Public routes (no auth required)
        .route("/public/recent", get(handlers::announcements::recent))
        .route("/public/:id", get(handlers::announcements::get))
        // Member routes
        .merge(
            Router::new()
                .route("/", get(handlers::announcements::list))
                .route("/dashboard", get(handlers::announcements::dashboard))
                .route("/stats", get(handlers::announcements::stats))
                .route("/:id", get(handlers::announcements::get))
                .route_layer(axum::middleware::from_fn_with_state(
                    state.clone(),
                    middleware::auth::require_auth,
                )),
        )
        // Admin routes
        .merge(
            Router::new()
                .route("/", post(handlers::announcements::create))
                .route("/:id", put(handlers::announcements::update))
                .route("/:id", delete(handlers::announcements::delete))
                .route_layer(axum::middleware::from_fn_with_state(
                    state,
                    middleware::auth::require_admin,
                )),
        )
}

fn activity_log_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/activity-logs", get(handlers::activity_logs::list))
        .route("/activity-logs/clear", delete(handlers::activity_logs::clear))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            middleware::auth::require_admin,
        ))
}
