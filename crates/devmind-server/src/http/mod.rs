//! HTTP surface: router, trigger endpoints, stats, health, metrics.
//!
//! The trigger endpoints are the contract external collaborators depend
//! on: paths, request bodies, and confirmation replies are fixed.

use axum::extract::State;
use axum::http::{HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use devmind_events::{IntegrationUpdate, QueryUpdate};
use serde_json::{Map, Value, json};
use tower_http::cors::{Any, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::state::AppState;
use crate::websocket::handler::ws_upgrade;

/// Build the application router.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(&state.settings.cors.allowed_origins);
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/ws/live", get(ws_upgrade))
        .route("/ws/trigger/query_update", post(trigger_query_update))
        .route(
            "/ws/trigger/integration_update",
            post(trigger_integration_update),
        )
        .route("/ws/trigger/insight", post(trigger_insight))
        .route("/ws/trigger/activity", post(trigger_activity))
        .route("/ws/stats", get(ws_stats))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS policy from settings. `"*"` in the origins list allows any
/// origin; otherwise only the listed origins are allowed (unparseable
/// entries are skipped with a warning).
fn cors_layer(allowed_origins: &[String]) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if allowed_origins.iter().any(|origin| origin == "*") {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| {
            origin
                .parse()
                .map_err(|_| warn!(origin = %origin, "skipping unparseable CORS origin"))
                .ok()
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// `GET /` — service identity and endpoint index.
async fn root() -> Json<Value> {
    Json(json!({
        "name": "DevMind Live",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ready",
        "endpoints": {
            "websocket": "/ws/live",
            "triggers": "/ws/trigger",
            "stats": "/ws/stats",
            "health": "/health",
            "metrics": "/metrics",
        },
    }))
}

/// `GET /health` — component health summary.
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "components": {
            "websocket": "healthy",
            "connections": state.registry.connection_count(),
        },
        "started_at": state.started_at.to_rfc3339(),
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

/// `GET /metrics` — Prometheus text exposition.
async fn metrics(State(state): State<AppState>) -> Response {
    match state.metrics.as_ref() {
        Some(handle) => crate::metrics::render(handle).into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "metrics recorder not installed",
        )
            .into_response(),
    }
}

/// `GET /ws/stats` — registry aggregate.
async fn ws_stats(State(state): State<AppState>) -> Json<Value> {
    let stats = state.registry.stats().await;
    Json(serde_json::to_value(stats).unwrap_or_else(|_| json!({})))
}

/// `POST /ws/trigger/query_update` — broadcast query progress.
async fn trigger_query_update(
    State(state): State<AppState>,
    Json(update): Json<QueryUpdate>,
) -> Json<Value> {
    state.notifier.query_update(update).await;
    Json(json!({"message": "Query update sent"}))
}

/// `POST /ws/trigger/integration_update` — broadcast integration status.
async fn trigger_integration_update(
    State(state): State<AppState>,
    Json(update): Json<IntegrationUpdate>,
) -> Json<Value> {
    state.notifier.integration_update(update).await;
    Json(json!({"message": "Integration update sent"}))
}

/// `POST /ws/trigger/insight` — broadcast a free-form insight payload,
/// project-routed when it carries a parseable `project_id`.
async fn trigger_insight(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Json<Value> {
    state.notifier.new_insight(payload).await;
    Json(json!({"message": "Insight notification sent"}))
}

/// `POST /ws/trigger/activity` — broadcast a free-form activity payload,
/// routed like insights.
async fn trigger_activity(
    State(state): State<AppState>,
    Json(payload): Json<Map<String, Value>>,
) -> Json<Value> {
    state.notifier.activity_update(payload).await;
    Json(json!({"message": "Activity update sent"}))
}
