//! REST API endpoints.
//!
//! Axum-based HTTP API over the league service. Every response uses the
//! same envelope: `{"success": true, "data": ...}` or
//! `{"success": false, "error": {"code", "message"}}`.

pub mod routes;
pub mod state;

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::{HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::Serialize;
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::config::ServerConfig;
use crate::error::LeagueError;
use crate::storage::StorageError;
use state::AppState;

/// API error types.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: ErrorDetail,
}

#[derive(Debug, Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::Conflict(_) => (StatusCode::CONFLICT, "CONFLICT"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        };

        let body = ErrorResponse {
            success: false,
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<LeagueError> for ApiError {
    fn from(err: LeagueError) -> Self {
        match err {
            LeagueError::Validation(e) => ApiError::BadRequest(e.to_string()),
            e @ LeagueError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            LeagueError::Persistence(StorageError::Constraint(msg)) => {
                warn!("Rejected write: {}", msg);
                ApiError::Conflict(msg)
            }
            LeagueError::Persistence(e) => {
                error!("Storage failure: {}", e);
                ApiError::Internal(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

/// Success envelope.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wrap `data` in the success envelope.
pub fn ok<T: Serialize>(data: T) -> ApiResult<T> {
    Ok(Json(ApiResponse {
        success: true,
        data,
    }))
}

/// Parse a path id, rejecting anything that is not an integer.
pub fn parse_id(raw: &str) -> Result<i64, ApiError> {
    raw.trim()
        .parse::<i64>()
        .map_err(|_| ApiError::BadRequest("id must be an integer".to_string()))
}

/// Body of a delete response.
#[derive(Debug, Serialize)]
pub struct Deleted {
    pub id: i64,
}

async fn route_not_found() -> ApiError {
    ApiError::NotFound("route not found".to_string())
}

fn cors_layer(origin: &str) -> CorsLayer {
    let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    match origin.trim() {
        "*" | "" => cors.allow_origin(Any),
        exact => match HeaderValue::from_str(exact) {
            Ok(value) => cors.allow_origin(value),
            Err(_) => {
                warn!("Invalid CORS origin {:?}, allowing any", exact);
                cors.allow_origin(Any)
            }
        },
    }
}

/// Build the `/api` router with CORS, request tracing and a request timeout.
pub fn build_router(state: AppState) -> Router {
    let server: ServerConfig = state.server.as_ref().clone();

    let api = Router::new()
        .route(
            "/players",
            get(routes::players::list_players).post(routes::players::create_player),
        )
        .route("/players/stats", get(routes::stats::stats_table))
        .route(
            "/players/:id",
            get(routes::players::get_player)
                .put(routes::players::update_player)
                .delete(routes::players::delete_player),
        )
        .route("/players/:id/stats", get(routes::stats::player_stats))
        .route(
            "/matches",
            get(routes::matches::list_matches).post(routes::matches::create_match),
        )
        .route("/matches/played", get(routes::matches::played_matches))
        .route(
            "/matches/:id",
            get(routes::matches::get_match)
                .put(routes::matches::update_match)
                .delete(routes::matches::delete_match),
        )
        .route(
            "/matches/:id/rounds",
            axum::routing::post(routes::matches::replace_rounds)
                .delete(routes::matches::clear_rounds),
        )
        .route("/kpis", get(routes::kpis::get_kpis));

    Router::new()
        .nest("/api", api)
        .fallback(route_not_found)
        .layer(TimeoutLayer::new(server.request_timeout()))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&server.cors_origin))
        .with_state(state)
}
