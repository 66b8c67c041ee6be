//! Synchronous health queries and manual alert commands
//!
//! The only component queried synchronously by external callers. Every
//! operation reads a copy of the shared state and returns quickly; empty
//! history yields zero-valued responses, never an error.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::MonitorError;
use crate::models::{
    Alert, AlertCounts, AlertListing, AlertSeverity, DetailedStats, HealthMetrics, HealthStatus,
    MetricSample, MetricSeriesStats, RequestRecord, RequestStats, SeriesPoint, ServiceStatus,
    StatsRange,
};
use crate::notifier::AlertNotifier;
use crate::store::SampleStore;

/// Number of active alerts previewed in the health response
const RECENT_ALERT_PREVIEW: usize = 5;

/// Serves the aggregate health signal and time-ranged statistics
pub struct HealthAggregator {
    store: Arc<SampleStore>,
    notifier: AlertNotifier,
    window: Duration,
    started_at: i64,
}

impl HealthAggregator {
    pub fn new(store: Arc<SampleStore>, notifier: AlertNotifier, window: Duration) -> Self {
        Self {
            store,
            notifier,
            window,
            started_at: Utc::now().timestamp_millis(),
        }
    }

    /// Current overall status, metric snapshot and alert preview
    pub fn health_status(&self) -> HealthStatus {
        let now = Utc::now().timestamp_millis();

        let (cpu, memory) = match self.store.latest_sample() {
            Some(sample) => (sample.cpu_percent, sample.memory_used_percent()),
            None => (0.0, 0.0),
        };

        let requests = self
            .store
            .requests_since(now - self.window.as_millis() as i64);
        let (error_rate, avg_response_time) = request_aggregates(&requests);

        let (total_requests, total_errors) = self.store.totals();

        let alerts = self.store.alerts_snapshot();
        let mut active: Vec<Alert> = alerts.into_iter().filter(|a| !a.resolved).collect();

        let critical = active
            .iter()
            .filter(|a| a.severity == AlertSeverity::High)
            .count();
        let status = if critical > 0 {
            ServiceStatus::Critical
        } else if !active.is_empty() {
            ServiceStatus::Warning
        } else {
            ServiceStatus::Healthy
        };

        active.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        let total = active.len();
        active.truncate(RECENT_ALERT_PREVIEW);

        HealthStatus {
            status,
            timestamp: now,
            uptime_seconds: ((now - self.started_at).max(0) / 1000) as u64,
            metrics: HealthMetrics {
                cpu,
                memory,
                error_rate,
                avg_response_time,
                total_requests,
                total_errors,
            },
            alerts: AlertCounts {
                total,
                critical,
                recent: active,
            },
        }
    }

    /// Raw filtered series plus aggregates over the requested range
    pub fn detailed_stats(&self, range: StatsRange) -> DetailedStats {
        let since = Utc::now().timestamp_millis() - range.as_millis();
        let samples = self.store.samples_since(since);
        let requests = self.store.requests_since(since);

        let (_, avg_response_time) = request_aggregates(&requests);
        let errors = requests.iter().filter(|r| r.has_error).count();

        DetailedStats {
            range,
            cpu: series_stats(&samples, |s| s.cpu_percent),
            memory: series_stats(&samples, |s| s.memory_used_percent()),
            disk: series_stats(&samples, |s| s.disk_usage_percent),
            requests: RequestStats {
                total: requests.len(),
                errors,
                average_response_time: avg_response_time,
                records: requests,
            },
        }
    }

    /// Mark an alert resolved. Returns false for unknown ids and for alerts
    /// that were already resolved.
    pub fn resolve_alert(&self, id: &str) -> bool {
        self.store.resolve_alert(id)
    }

    /// Manual alert creation. Validated at the boundary before any state
    /// mutation; follows the same append + conditional-notify path as the
    /// evaluator.
    pub fn create_alert(
        &self,
        alert_type: &str,
        message: &str,
        severity: AlertSeverity,
    ) -> Result<Alert, MonitorError> {
        if alert_type.trim().is_empty() {
            return Err(MonitorError::MissingAlertType);
        }
        if message.trim().is_empty() {
            return Err(MonitorError::MissingAlertMessage);
        }

        let alert = Alert::new(alert_type, message, severity);
        self.notifier.notify_if_high(&alert);
        self.store.push_alert(alert.clone());
        Ok(alert)
    }

    /// All alerts split by resolution state
    pub fn alert_listing(&self) -> AlertListing {
        let alerts = self.store.alerts_snapshot();
        let total = alerts.len();
        let (active, resolved) = alerts.into_iter().partition(|a| !a.resolved);
        AlertListing {
            active,
            resolved,
            total,
        }
    }
}

fn request_aggregates(requests: &[RequestRecord]) -> (f64, f64) {
    if requests.is_empty() {
        return (0.0, 0.0);
    }
    let count = requests.len() as f64;
    let errors = requests.iter().filter(|r| r.has_error).count() as f64;
    let total_time: u64 = requests.iter().map(|r| r.response_time_millis).sum();
    (errors / count * 100.0, total_time as f64 / count)
}

fn series_stats(samples: &[MetricSample], value: impl Fn(&MetricSample) -> f64) -> MetricSeriesStats {
    let points: Vec<SeriesPoint> = samples
        .iter()
        .map(|s| SeriesPoint {
            timestamp: s.timestamp,
            value: value(s),
        })
        .collect();

    if points.is_empty() {
        return MetricSeriesStats {
            average: 0.0,
            max: 0.0,
            samples: points,
        };
    }

    let sum: f64 = points.iter().map(|p| p.value).sum();
    let max = points.iter().map(|p| p.value).fold(f64::MIN, f64::max);
    MetricSeriesStats {
        average: sum / points.len() as f64,
        max,
        samples: points,
    }
}
