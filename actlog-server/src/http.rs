//! Activity-log HTTP ingestion API
//!
//! Axum-based HTTP server that accepts client activity events and persists
//! them to the SQLite store. Cross-origin requests are allowed from any
//! origin so browser clients can post directly during a live event.
//!
//! Architecture: each endpoint has a thin axum handler that delegates to a
//! pure inner function. The inner functions are directly testable without
//! axum dispatch machinery.
//!
//! Endpoints:
//! - GET  /health       — health check with DB status
//! - POST /api/log_data — log one activity event

use std::sync::Arc;

use anyhow::Result;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use sqlx::SqlitePool;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::cors::CorsLayer;

/// Shared state for all HTTP handlers
#[derive(Clone)]
pub struct HttpState {
    pub pool: SqlitePool,
}

/// Build the Axum router with all endpoints and permissive CORS.
pub fn build_router(state: Arc<HttpState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/log_data", post(log_data_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server on the given address.
/// Gracefully shuts down when the broadcast shutdown signal fires.
pub async fn start_http_server(
    pool: SqlitePool,
    addr: &str,
    mut shutdown: broadcast::Receiver<()>,
) -> Result<()> {
    let state = Arc::new(HttpState { pool });

    let app = build_router(state);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!("Activity log HTTP API listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = shutdown.recv().await;
            tracing::info!("HTTP server shutting down...");
        })
        .await?;

    Ok(())
}

// ============================================================================
// Response helpers
// ============================================================================

fn error_body(message: impl Into<String>) -> serde_json::Value {
    serde_json::json!({
        "status": "error",
        "message": message.into(),
    })
}

// ============================================================================
// Inner (directly testable) business logic functions
// ============================================================================

/// Inner health check — queries the store and returns (status_code, json_body).
pub async fn health_inner(pool: &SqlitePool) -> (StatusCode, serde_json::Value) {
    match actlog_core::db::health_check(pool).await {
        Ok(v) => (
            StatusCode::OK,
            serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "sqlite": v,
            }),
        ),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            serde_json::json!({
                "status": "unhealthy",
                "error": e.to_string(),
            }),
        ),
    }
}

/// Inner log_data — validates the raw request body and inserts one row.
///
/// The body is parsed here rather than by an extractor so that every
/// rejection keeps the `{status, message}` response shape. Validation order:
/// JSON parse, required fields, payload serialization, then the insert.
pub async fn log_data_inner(pool: &SqlitePool, body: &str) -> (StatusCode, serde_json::Value) {
    let data: serde_json::Value = match serde_json::from_str(body) {
        Ok(v) => v,
        Err(_) => {
            return (StatusCode::BAD_REQUEST, error_body("Request must be JSON"));
        }
    };

    let session_id = data
        .get("sessionId")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty());
    let data_type = data
        .get("dataType")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty());
    let client_timestamp = data
        .get("clientTimestamp")
        .and_then(serde_json::Value::as_str)
        .filter(|s| !s.is_empty());
    // `null` counts as absent; `false`, `0`, `{}`, `[]` are all valid payloads.
    let payload = data.get("payload").filter(|p| !p.is_null());

    let (session_id, data_type, client_timestamp, payload) =
        match (session_id, data_type, client_timestamp, payload) {
            (Some(s), Some(d), Some(c), Some(p)) => (s, d, c, p),
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    error_body(
                        "Missing required fields: sessionId, dataType, clientTimestamp, payload",
                    ),
                );
            }
        };

    let data_content = match serde_json::to_string(payload) {
        Ok(s) => s,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                error_body(format!("Error serializing payload: {}", e)),
            );
        }
    };

    match actlog_core::db::insert_event(pool, session_id, data_type, &data_content, client_timestamp)
        .await
    {
        Ok(log_id) => (
            StatusCode::CREATED,
            serde_json::json!({
                "status": "success",
                "message": "Data logged successfully.",
                "log_id": log_id,
            }),
        ),
        Err(e) => {
            // Full detail stays server-side; the caller gets a generic message.
            tracing::error!("Database error inserting activity event: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, error_body("Database error"))
        }
    }
}

// ============================================================================
// Axum handler wrappers (thin — delegate to inner functions)
// ============================================================================

pub async fn health_handler(State(state): State<Arc<HttpState>>) -> impl IntoResponse {
    let (status, body) = health_inner(&state.pool).await;
    (status, Json(body))
}

pub async fn log_data_handler(
    State(state): State<Arc<HttpState>>,
    body: String,
) -> impl IntoResponse {
    let (status, body) = log_data_inner(&state.pool, &body).await;
    (status, Json(body))
}

// ============================================================================
// Unit Tests — call inner functions directly
// ============================================================================
