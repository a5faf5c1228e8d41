//! HTTP route definitions

use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query, State,
    },
    http::{header, Method, StatusCode},
    middleware,
    response::{IntoResponse, Json},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer,
};
use tracing::debug;

use crate::app::AppState;
use crate::game::{normalize_room_code, PongError, Role, RoomView};
use crate::http::middleware::{rate_limit, require_auth, AuthenticatedUser};
use crate::util::time::{unix_millis, uptime_secs};

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
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);

    // Public routes (no auth required)
    let public_routes = Router::new().route("/health", get(health_handler));

    // Match routes (auth required, rate limited per player)
    let pong_routes = Router::new()
        .route("/pong/create", post(create_handler))
        .route("/pong/join", post(join_handler))
        .route("/pong/input", post(input_handler))
        .route("/pong/restart", post(restart_handler))
        .route("/pong/state", get(state_handler))
        .route_layer(middleware::from_fn_with_state(state.clone(), rate_limit))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public_routes)
        .merge(pong_routes)
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(10)))
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
    active_rooms: usize,
}

async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: uptime_secs(),
        active_rooms: state.rooms.len(),
    })
}

// ============================================================================
// Match endpoints
// ============================================================================

#[derive(Deserialize)]
struct CodeRequest {
    #[serde(default)]
    code: String,
}

#[derive(Deserialize)]
struct InputRequest {
    #[serde(default)]
    code: String,
    /// Left loose so a missing or non-numeric `y` maps to a domain error
    #[serde(default)]
    y: serde_json::Value,
}

#[derive(Serialize)]
struct RoleResponse {
    code: String,
    role: Role,
}

#[derive(Serialize)]
struct OkResponse {
    ok: bool,
}

async fn create_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Json<RoleResponse> {
    let (code, role) = state
        .rooms
        .create_room(auth.user_id, &auth.display_name, unix_millis());

    Json(RoleResponse { code, role })
}

async fn join_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<RoleResponse>, AppError> {
    let Json(req) = payload?;
    let code = normalize_room_code(&req.code)?;

    let role = state
        .rooms
        .join_room(&code, auth.user_id, &auth.display_name, unix_millis())?;

    Ok(Json(RoleResponse { code, role }))
}

async fn input_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<InputRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = payload?;
    let code = normalize_room_code(&req.code)?;
    let y = req.y.as_f64().ok_or(PongError::InvalidArgument("y"))?;

    state
        .rooms
        .submit_input(&code, auth.user_id, y, unix_millis())?;

    Ok(Json(OkResponse { ok: true }))
}

async fn restart_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    payload: Result<Json<CodeRequest>, JsonRejection>,
) -> Result<Json<OkResponse>, AppError> {
    let Json(req) = payload?;
    let code = normalize_room_code(&req.code)?;

    state
        .rooms
        .restart_room(&code, auth.user_id, unix_millis())?;

    Ok(Json(OkResponse { ok: true }))
}

async fn state_handler(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    query: Result<Query<CodeRequest>, QueryRejection>,
) -> Result<Json<RoomView>, AppError> {
    let Query(req) = query?;
    let code = normalize_room_code(&req.code)?;

    let view = state.rooms.get_state(&code, auth.user_id, unix_millis())?;
    Ok(Json(view))
}

// ============================================================================
// Error handling
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    Game(#[from] PongError),
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = match &self {
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "invalid_argument"),
            AppError::Game(err) => {
                let status = match err {
                    PongError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
                    PongError::NotFound => StatusCode::NOT_FOUND,
                    PongError::Forbidden => StatusCode::FORBIDDEN,
                    PongError::RoomFull | PongError::NeedSecondPlayer => StatusCode::CONFLICT,
                };
                (status, err.code())
            }
        };
        debug!(status = %status, error = %self, "Request rejected");

        let body = serde_json::json!({
            "error": self.to_string(),
            "code": code,
        });

        (status, Json(body)).into_response()
    }
}
