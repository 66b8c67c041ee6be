//! HTTP API for health, statistics and alert management

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{AlertSeverity, MonitorService, StatsRange};
use serde::{Deserialize, Serialize};
use tracing::info;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MonitorService>,
}

impl AppState {
    pub fn new(service: Arc<MonitorService>) -> Self {
        Self { service }
    }
}

/// Aggregate health signal. Responds even with empty history.
async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.aggregator().health_status())
}

#[derive(Debug, Deserialize)]
struct StatsQuery {
    #[serde(default = "default_range")]
    range: StatsRange,
}

fn default_range() -> StatsRange {
    StatsRange::OneHour
}

/// Time-ranged statistics; unknown `range` values are rejected with 400
async fn metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    Json(state.service.aggregator().detailed_stats(query.range))
}

/// Alert listing split by resolution state
async fn alerts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(state.service.aggregator().alert_listing())
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResolveRequest {
    alert_id: String,
}

#[derive(Debug, Serialize)]
struct CommandResponse {
    success: bool,
    message: String,
}

async fn resolve_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResolveRequest>,
) -> impl IntoResponse {
    if state.service.aggregator().resolve_alert(&req.alert_id) {
        (
            StatusCode::OK,
            Json(CommandResponse {
                success: true,
                message: format!("Alert {} resolved", req.alert_id),
            }),
        )
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(CommandResponse {
                success: false,
                message: "Alert not found".to_string(),
            }),
        )
    }
}

#[derive(Debug, Deserialize)]
struct CreateAlertRequest {
    #[serde(rename = "type", default)]
    alert_type: String,
    #[serde(default)]
    message: String,
    severity: Option<AlertSeverity>,
}

async fn create_alert(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateAlertRequest>,
) -> Response {
    let severity = req.severity.unwrap_or(AlertSeverity::Medium);
    match state
        .service
        .aggregator()
        .create_alert(&req.alert_type, &req.message, severity)
    {
        Ok(alert) => (StatusCode::CREATED, Json(alert)).into_response(),
        Err(e) => (
            StatusCode::BAD_REQUEST,
            Json(CommandResponse {
                success: false,
                message: e.to_string(),
            }),
        )
            .into_response(),
    }
}

/// Request instrumentation: records elapsed time and the error flag once
/// the response has been produced
async fn track_requests(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Response {
    let start = Instant::now();
    let response = next.run(request).await;

    let elapsed_millis = start.elapsed().as_millis() as u64;
    let has_error = response.status().as_u16() >= 400;
    state.service.record_request(elapsed_millis, has_error);

    response
}

/// Create the API router
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/alerts", get(alerts))
        .route("/alerts/resolve", post(resolve_alert))
        .route("/alerts/create", post(create_alert))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

/// Start the API server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = create_router(state);

    let addr = format!("0.0.0.0:{}", port);
    info!(addr = %addr, "Starting API server");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
