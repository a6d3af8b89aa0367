//! HTTP surface: routing, shared state, and the `/process_code` handler.
//!
//! The handler walks the pipeline in order: rate-limit admission, input
//! validation, action parsing, dispatch. Validation and rate-limit
//! failures return immediately without touching any backend, and a panic
//! anywhere is converted to a generic 500 envelope by the outermost layer.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::body::{to_bytes, Body};
use axum::extract::{ConnectInfo, State};
use axum::http::{header, Method, Request, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::backends::lint::LintBackend;
use crate::backends::{Action, Capabilities};
use crate::config::ServiceConfig;
use crate::dispatch::dispatch;
use crate::envelope::Envelope;
use crate::error::AnalysisError;
use crate::rate_limit::RateLimiter;
use crate::validate::{InputValidator, ValidationOutcome};

/// Shared service state, created once at startup.
pub struct AppState {
    pub config: ServiceConfig,
    pub limiter: RateLimiter,
    pub lint: LintBackend,
    pub capabilities: Capabilities,
}

impl AppState {
    /// Probe backends and build the capability registry.
    pub async fn initialize(config: ServiceConfig) -> Self {
        let lint = LintBackend::resolve(&config.lint).await;
        let capabilities = Capabilities::detect(lint.is_available());
        let limiter = RateLimiter::new(config.rate_limit_per_minute);
        Self {
            config,
            limiter,
            lint,
            capabilities,
        }
    }
}

/// The JSON body accepted by `/process_code`.
#[derive(Debug, Deserialize)]
struct ProcessRequest {
    #[serde(default)]
    code: String,

    #[serde(default = "default_action")]
    action: String,
}

fn default_action() -> String {
    "check".to_string()
}

/// Build the service router over shared state.
pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/process_code", post(process_code))
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

/// Bind and serve until the process exits.
pub async fn serve(config: ServiceConfig) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.host, config.port);
    let state = Arc::new(AppState::initialize(config).await);
    let router = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(%addr, "quench listening");

    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server failed")
}

async fn index() -> Html<&'static str> {
    Html(include_str!("../static/index.html"))
}

async fn health(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": Utc::now().to_rfc3339(),
        "features": state.capabilities,
    }))
}

async fn process_code(
    State(state): State<Arc<AppState>>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    request: Request<Body>,
) -> Response {
    let client_id = client_id(&request, connect_info);

    // Admission is checked before anything else is spent on the request.
    if !state.limiter.admit(&client_id, Utc::now()) {
        return reject(&AnalysisError::RateLimitExceeded);
    }

    let bytes = match to_bytes(request.into_body(), state.config.max_body_bytes).await {
        Ok(bytes) => bytes,
        Err(_) => {
            let envelope = Envelope::error(format!(
                "Request too large. Maximum request size is {} bytes.",
                state.config.max_body_bytes
            ));
            return respond(StatusCode::PAYLOAD_TOO_LARGE, envelope);
        }
    };

    let request: ProcessRequest = match serde_json::from_slice(&bytes) {
        Ok(request) => request,
        Err(_) => {
            return reject(&AnalysisError::InvalidInput(
                "Request body must be valid JSON with a 'code' field".to_string(),
            ));
        }
    };

    let validator = InputValidator::new(state.config.max_code_chars);
    if let ValidationOutcome::Invalid(reason) = validator.validate(&request.code) {
        return reject(&AnalysisError::InvalidInput(reason));
    }

    let action: Action = match request.action.parse() {
        Ok(action) => action,
        Err(message) => return reject(&AnalysisError::InvalidInput(message)),
    };

    info!(action = %request.action, client = %client_id, "processing code");

    let (status, envelope) = dispatch(action, request.code, &state.lint).await;
    respond(status, envelope)
}

/// Client identity for rate limiting: the first `X-Forwarded-For` entry
/// when present, else the peer address.
fn client_id(request: &Request<Body>, connect_info: Option<ConnectInfo<SocketAddr>>) -> String {
    request
        .headers()
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .unwrap_or_else(|| {
            connect_info
                .map(|ConnectInfo(addr)| addr.ip().to_string())
                .unwrap_or_else(|| "unknown".to_string())
        })
}

fn respond(status: StatusCode, envelope: Envelope) -> Response {
    (status, Json(envelope)).into_response()
}

fn reject(err: &AnalysisError) -> Response {
    respond(err.status_code(), Envelope::from(err))
}

fn handle_panic(_err: Box<dyn std::any::Any + Send + 'static>) -> Response {
    respond(
        StatusCode::INTERNAL_SERVER_ERROR,
        Envelope::error("An unexpected error occurred while processing your code."),
    )
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
}
