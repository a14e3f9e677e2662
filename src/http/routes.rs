//! HTTP route definitions

use axum::{
    extract::State,
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, patch, post},
    Router,
};
use serde::Serialize;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::error;

use crate::app::AppState;
use crate::http::middleware::{require_auth, AuthError};
use crate::http::{ai, customers, dashboard, invoices, products, sellers};
use crate::store::StoreError;
use crate::usecases::UseCaseError;
use crate::util::time::uptime_secs;

/// Build the application router
pub fn build_router(state: AppState) -> Router {
    // CORS configuration - support multiple origins (comma-separated in CLIENT_ORIGIN)
    let allowed_origins: Vec<header::HeaderValue> = state
        .config
        .client_origin
        .split(',')
        .filter_map(|s| s.trim().parse::<header::HeaderValue>().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/health", get(health_handler))
        .route("/api/sellers/register", post(sellers::register))
        .route("/api/sellers/login", post(sellers::login));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/sellers/me", get(sellers::me).patch(sellers::update_me))
        .route(
            "/api/sellers/me/settings",
            get(sellers::get_settings).put(sellers::save_settings),
        )
        .route("/api/products", get(products::list).post(products::create))
        .route(
            "/api/products/:id",
            get(products::get)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/api/customers", get(customers::list).post(customers::create))
        .route(
            "/api/customers/:id",
            get(customers::get)
                .patch(customers::update)
                .delete(customers::delete),
        )
        .route("/api/customers/:id/invoices", get(customers::invoices))
        .route("/api/invoices", get(invoices::list).post(invoices::create))
        .route("/api/invoices/:id", get(invoices::get).delete(invoices::delete))
        .route("/api/invoices/:id/status", patch(invoices::update_payment))
        .route("/api/dashboard", get(dashboard::summary))
        .route("/api/ai/description", post(ai::description))
        .route("/api/ai/price", post(ai::price))
        .route("/api/ai/autofill", post(ai::autofill))
        .route("/api/ai/import", post(ai::import))
        .layer(middleware::from_fn_with_state(state.clone(), require_auth));

    let timeout = state.config.request_timeout;

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ============================================================================
// Health endpoint
// ============================================================================

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    uptime_secs: u64,
    ai_provider: Option<String>,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        ai_provider: state.ai.as_ref().map(|ai| ai.provider().to_string()),
    })
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Too many requests")]
    TooManyRequests,

    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("Upstream error: {0}")]
    BadGateway(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<UseCaseError> for AppError {
    fn from(err: UseCaseError) -> Self {
        match err {
            UseCaseError::Validation(msg) => AppError::BadRequest(msg),
            UseCaseError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            UseCaseError::Conflict(msg) => AppError::Conflict(msg),
            UseCaseError::InvalidCredentials => {
                AppError::Unauthorized("Invalid email or password".to_string())
            }
            UseCaseError::AiUnavailable => {
                AppError::ServiceUnavailable("AI assistant is not configured".to_string())
            }
            UseCaseError::Ai(e) => AppError::BadGateway(e.to_string()),
            UseCaseError::Store(e) => e.into(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => AppError::NotFound("Resource not found".to_string()),
            StoreError::Conflict => AppError::Conflict("Resource already exists".to_string()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for AppError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AppError::BadRequest(crate::usecases::validation_message(&errors))
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            AppError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone()),
            AppError::TooManyRequests => (
                StatusCode::TOO_MANY_REQUESTS,
                "Too many AI requests, try again in a minute".to_string(),
            ),
            AppError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg.clone()),
            AppError::BadGateway(msg) => {
                error!(error = %msg, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, "AI provider request failed".to_string())
            }
            AppError::Internal(msg) => {
                error!(error = %msg, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
