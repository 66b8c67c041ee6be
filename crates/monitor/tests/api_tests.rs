//! Integration tests for the monitor API endpoints

use std::sync::Arc;
use std::time::Instant;

use axum::{
    body::Body,
    extract::{Query, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use monitor_lib::{AlertSeverity, LogSink, MonitorService, ServiceConfig, StatsRange};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tower::ServiceExt;

use anyhow::Result;
use async_trait::async_trait;
use monitor_lib::collector::SystemProbe;
use monitor_lib::MetricSample;

struct StaticProbe;

#[async_trait]
impl SystemProbe for StaticProbe {
    async fn sample(&self) -> Result<MetricSample> {
        Ok(MetricSample {
            timestamp: chrono::Utc::now().timestamp_millis(),
            cpu_percent: 25.0,
            memory_total_bytes: 8_000_000_000,
            memory_used_bytes: 4_000_000_000,
            memory_free_percent: 50.0,
            disk_total_bytes: 100_000_000_000,
            disk_used_bytes: 40_000_000_000,
            disk_usage_percent: 40.0,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub service: Arc<MonitorService>,
}

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

async fn metrics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StatsQuery>,
) -> impl IntoResponse {
    Json(state.service.aggregator().detailed_stats(query.range))
}

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

fn create_test_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/alerts", get(alerts))
        .route("/alerts/resolve", post(resolve_alert))
        .route("/alerts/create", post(create_alert))
        .layer(middleware::from_fn_with_state(state.clone(), track_requests))
        .with_state(state)
}

fn setup_test_app() -> (Router, Arc<AppState>) {
    // Background loops are deliberately not started; the handlers read the
    // store synchronously
    let service = Arc::new(MonitorService::new(
        ServiceConfig::default(),
        Arc::new(StaticProbe),
        Arc::new(LogSink),
    ));
    let state = Arc::new(AppState { service });
    let router = create_test_router(state.clone());

    (router, state)
}

async fn body_json(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

fn get_request(uri: &str) -> Request {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_request(uri: &str, body: Value) -> Request {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_health_with_empty_history() {
    let (app, _state) = setup_test_app();

    let response = app.oneshot(get_request("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let health = body_json(response).await;
    assert_eq!(health["status"], "healthy");
    assert_eq!(health["metrics"]["cpu"], 0.0);
    assert_eq!(health["metrics"]["totalRequests"], 0);
    assert_eq!(health["alerts"]["total"], 0);
}

#[tokio::test]
async fn test_instrumentation_counts_requests() {
    let (app, state) = setup_test_app();

    app.clone().oneshot(get_request("/health")).await.unwrap();
    app.clone().oneshot(get_request("/health")).await.unwrap();

    let (total, errors) = state.service.store().totals();
    assert_eq!(total, 2);
    assert_eq!(errors, 0);

    // The next health response reports the running totals
    let response = app.oneshot(get_request("/health")).await.unwrap();
    let health = body_json(response).await;
    assert_eq!(health["metrics"]["totalRequests"], 2);
}

#[tokio::test]
async fn test_instrumentation_flags_error_responses() {
    let (app, state) = setup_test_app();

    // Unknown alert id produces a 404, which must count as an error
    let response = app
        .oneshot(post_request(
            "/alerts/resolve",
            json!({"alertId": "nonexistent"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    let (total, errors) = state.service.store().totals();
    assert_eq!(total, 1);
    assert_eq!(errors, 1);
}

#[tokio::test]
async fn test_metrics_empty_range_yields_zero_aggregates() {
    let (app, _state) = setup_test_app();

    let response = app.oneshot(get_request("/metrics?range=6h")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["range"], "6h");
    assert_eq!(stats["cpu"]["average"], 0.0);
    assert_eq!(stats["cpu"]["max"], 0.0);
    assert_eq!(stats["requests"]["total"], 0);
}

#[tokio::test]
async fn test_metrics_defaults_to_one_hour() {
    let (app, _state) = setup_test_app();

    let response = app.oneshot(get_request("/metrics")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let stats = body_json(response).await;
    assert_eq!(stats["range"], "1h");
}

#[tokio::test]
async fn test_metrics_rejects_unknown_range() {
    let (app, _state) = setup_test_app();

    let response = app.oneshot(get_request("/metrics?range=7d")).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_create_alert_returns_created() {
    let (app, _state) = setup_test_app();

    let response = app
        .oneshot(post_request(
            "/alerts/create",
            json!({"type": "MANUAL_CHECK", "message": "operator test", "severity": "high"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let alert = body_json(response).await;
    assert_eq!(alert["type"], "MANUAL_CHECK");
    assert_eq!(alert["severity"], "high");
    assert_eq!(alert["resolved"], false);
    assert!(alert["id"].as_str().is_some());
}

#[tokio::test]
async fn test_create_alert_defaults_to_medium_severity() {
    let (app, _state) = setup_test_app();

    let response = app
        .oneshot(post_request(
            "/alerts/create",
            json!({"type": "MANUAL_CHECK", "message": "no severity given"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let alert = body_json(response).await;
    assert_eq!(alert["severity"], "medium");
}

#[tokio::test]
async fn test_create_alert_missing_fields_rejected() {
    let (app, _state) = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_request(
            "/alerts/create",
            json!({"message": "no type"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(post_request("/alerts/create", json!({"type": "T"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body = body_json(response).await;
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_resolve_flow() {
    let (app, _state) = setup_test_app();

    let response = app
        .clone()
        .oneshot(post_request(
            "/alerts/create",
            json!({"type": "T", "message": "to resolve"}),
        ))
        .await
        .unwrap();
    let alert = body_json(response).await;
    let id = alert["id"].as_str().unwrap().to_string();

    let response = app
        .clone()
        .oneshot(post_request("/alerts/resolve", json!({"alertId": id})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["success"], true);

    let response = app.oneshot(get_request("/alerts")).await.unwrap();
    let listing = body_json(response).await;
    assert_eq!(listing["total"], 1);
    assert_eq!(listing["active"].as_array().unwrap().len(), 0);
    assert_eq!(listing["resolved"].as_array().unwrap().len(), 1);
    assert_eq!(listing["resolved"][0]["resolved"], true);
}

#[tokio::test]
async fn test_high_alert_makes_health_critical() {
    let (app, _state) = setup_test_app();

    app.clone()
        .oneshot(post_request(
            "/alerts/create",
            json!({"type": "T", "message": "boom", "severity": "high"}),
        ))
        .await
        .unwrap();

    let response = app.oneshot(get_request("/health")).await.unwrap();
    let health = body_json(response).await;
    assert_eq!(health["status"], "critical");
    assert_eq!(health["alerts"]["critical"], 1);
    assert_eq!(health["alerts"]["recent"].as_array().unwrap().len(), 1);
}
