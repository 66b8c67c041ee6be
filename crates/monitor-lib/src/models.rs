//! Core data models for the host monitor

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// One host resource measurement, produced once per collection tick
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSample {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    /// Average utilization across all logical cores, 0-100
    pub cpu_percent: f64,
    pub memory_total_bytes: u64,
    pub memory_used_bytes: u64,
    pub memory_free_percent: f64,
    pub disk_total_bytes: u64,
    pub disk_used_bytes: u64,
    pub disk_usage_percent: f64,
}

impl MetricSample {
    /// Memory usage as a percentage of total
    pub fn memory_used_percent(&self) -> f64 {
        100.0 - self.memory_free_percent
    }
}

/// One completed HTTP request observation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestRecord {
    /// Unix timestamp in milliseconds
    pub timestamp: i64,
    pub response_time_millis: u64,
    pub has_error: bool,
}

/// Alert severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Medium,
    High,
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertSeverity::Medium => write!(f, "medium"),
            AlertSeverity::High => write!(f, "high"),
        }
    }
}

/// Alert type classification for the built-in threshold checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlertType {
    HighCpuUsage,
    HighMemoryUsage,
    SlowResponseTime,
    HighErrorRate,
}

impl std::fmt::Display for AlertType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AlertType::HighCpuUsage => write!(f, "HIGH_CPU_USAGE"),
            AlertType::HighMemoryUsage => write!(f, "HIGH_MEMORY_USAGE"),
            AlertType::SlowResponseTime => write!(f, "SLOW_RESPONSE_TIME"),
            AlertType::HighErrorRate => write!(f, "HIGH_ERROR_RATE"),
        }
    }
}

/// A raised alert. Mutated only by resolution.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Alert {
    pub id: String,
    #[serde(rename = "type")]
    pub alert_type: String,
    pub message: String,
    pub severity: AlertSeverity,
    /// Unix timestamp in milliseconds
    pub created_at: i64,
    pub resolved: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<i64>,
}

impl Alert {
    /// Create a new unresolved alert with a unique id.
    ///
    /// The id combines the creation timestamp with a sub-millisecond
    /// tiebreaker so two alerts created in the same millisecond stay
    /// distinguishable.
    pub fn new(alert_type: impl Into<String>, message: impl Into<String>, severity: AlertSeverity) -> Self {
        let now = Utc::now();
        let created_at = now.timestamp_millis();
        Self {
            id: format!("{}-{:x}", created_at, now.timestamp_subsec_nanos()),
            alert_type: alert_type.into(),
            message: message.into(),
            severity,
            created_at,
            resolved: false,
            resolved_at: None,
        }
    }
}

/// Threshold configuration for the alert evaluator. Read-only after startup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Thresholds {
    pub cpu_percent: f64,
    pub memory_percent: f64,
    pub disk_percent: f64,
    pub response_time_millis: f64,
    pub error_rate_percent: f64,
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            cpu_percent: 80.0,
            memory_percent: 85.0,
            disk_percent: 90.0,
            response_time_millis: 5000.0,
            error_rate_percent: 10.0,
        }
    }
}

/// Time range selector for detailed statistics queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StatsRange {
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "6h")]
    SixHours,
    #[serde(rename = "24h")]
    TwentyFourHours,
}

impl StatsRange {
    pub fn as_millis(&self) -> i64 {
        match self {
            StatsRange::OneHour => 60 * 60 * 1000,
            StatsRange::SixHours => 6 * 60 * 60 * 1000,
            StatsRange::TwentyFourHours => 24 * 60 * 60 * 1000,
        }
    }
}

impl std::fmt::Display for StatsRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatsRange::OneHour => write!(f, "1h"),
            StatsRange::SixHours => write!(f, "6h"),
            StatsRange::TwentyFourHours => write!(f, "24h"),
        }
    }
}

/// Derived overall service status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceStatus {
    Healthy,
    Warning,
    Critical,
}

/// Current metric snapshot reported by the health endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthMetrics {
    pub cpu: f64,
    pub memory: f64,
    pub error_rate: f64,
    pub avg_response_time: f64,
    pub total_requests: u64,
    pub total_errors: u64,
}

/// Alert counts and a preview of the most recent active alerts
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertCounts {
    pub total: usize,
    pub critical: usize,
    pub recent: Vec<Alert>,
}

/// Aggregate health signal, computed on demand and never stored
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthStatus {
    pub status: ServiceStatus,
    pub timestamp: i64,
    #[serde(rename = "uptime")]
    pub uptime_seconds: u64,
    pub metrics: HealthMetrics,
    pub alerts: AlertCounts,
}

/// Raw points plus aggregates for one metric series
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricSeriesStats {
    pub average: f64,
    pub max: f64,
    pub samples: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeriesPoint {
    pub timestamp: i64,
    pub value: f64,
}

/// Request aggregates over a queried range
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestStats {
    pub total: usize,
    pub errors: usize,
    pub average_response_time: f64,
    pub records: Vec<RequestRecord>,
}

/// Time-ranged statistics response
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailedStats {
    pub range: StatsRange,
    pub cpu: MetricSeriesStats,
    pub memory: MetricSeriesStats,
    pub disk: MetricSeriesStats,
    pub requests: RequestStats,
}

/// Alert listing split by resolution state
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertListing {
    pub active: Vec<Alert>,
    pub resolved: Vec<Alert>,
    pub total: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alert_ids_distinct_within_same_millisecond() {
        let a = Alert::new("TEST", "one", AlertSeverity::Medium);
        let b = Alert::new("TEST", "two", AlertSeverity::Medium);
        assert_ne!(a.id, b.id);
    }

    #[test]
    fn test_alert_type_display() {
        assert_eq!(AlertType::HighCpuUsage.to_string(), "HIGH_CPU_USAGE");
        assert_eq!(AlertType::HighErrorRate.to_string(), "HIGH_ERROR_RATE");
    }

    #[test]
    fn test_severity_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&AlertSeverity::High).unwrap(), "\"high\"");
        assert_eq!(serde_json::to_string(&AlertSeverity::Medium).unwrap(), "\"medium\"");
    }

    #[test]
    fn test_stats_range_parsing() {
        let range: StatsRange = serde_json::from_str("\"6h\"").unwrap();
        assert_eq!(range, StatsRange::SixHours);
        assert_eq!(StatsRange::TwentyFourHours.as_millis(), 86_400_000);
    }

    #[test]
    fn test_default_thresholds() {
        let t = Thresholds::default();
        assert_eq!(t.cpu_percent, 80.0);
        assert_eq!(t.memory_percent, 85.0);
        assert_eq!(t.disk_percent, 90.0);
        assert_eq!(t.response_time_millis, 5000.0);
        assert_eq!(t.error_rate_percent, 10.0);
    }
}
