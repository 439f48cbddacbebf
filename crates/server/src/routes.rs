use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use common::types::ApiResponse;
use service::PortalService;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::metrics;

pub mod portal;

/// Shared handler state; cloning only bumps the store's reference count.
#[derive(Clone)]
pub struct AppState {
    pub portal: PortalService,
}

pub async fn health() -> Json<ApiResponse<()>> {
    Json(ApiResponse::message("Complaint Portal API is running"))
}

async fn method_not_allowed() -> (StatusCode, Json<ApiResponse<()>>) {
    (StatusCode::METHOD_NOT_ALLOWED, Json(ApiResponse::error("Method not allowed")))
}

async fn metrics_endpoint(State(state): State<AppState>) -> (StatusCode, String) {
    metrics::observe(state.portal.stats());
    metrics::encode_metrics()
}

/// Build the full application router: portal endpoints, health and metrics
pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics_endpoint))
        .route("/register", post(portal::register))
        .route("/login", post(portal::login));

    // Every route below authenticates with the caller's secret code
    let portal_routes = Router::new()
        .route("/submitComplaint", post(portal::submit_complaint))
        .route("/getAllComplaintsForUser", post(portal::complaints_for_user))
        .route("/getAllComplaintsForAdmin", post(portal::complaints_for_admin))
        .route("/viewComplaint", post(portal::view_complaint))
        .route("/resolveComplaint", post(portal::resolve_complaint));

    public
        .merge(portal_routes)
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state)
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                // one span per request with method and path
                .make_span_with(
                    DefaultMakeSpan::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_request(
                    DefaultOnRequest::new()
                        .level(Level::INFO),
                )
                // status code and latency
                .on_response(
                    DefaultOnResponse::new()
                        .level(Level::INFO)
                        .include_headers(false),
                )
                .on_failure(
                    DefaultOnFailure::new()
                        .level(Level::ERROR),
                )
        )
}
