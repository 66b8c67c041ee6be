//! Shared in-memory store for samples, request records and alerts
//!
//! This is the single owner of all monitoring state. Five actors touch it
//! concurrently (HTTP handlers, collector, evaluator, retention loop and
//! synchronous health reads), so every operation goes through one coarse
//! lock and reads copy data out rather than returning references.

use std::collections::VecDeque;
use std::sync::RwLock;

use chrono::Utc;
use tracing::debug;

use crate::models::{Alert, MetricSample, RequestRecord};

/// Maximum number of detailed request records retained
pub const REQUEST_HISTORY_CAP: usize = 1000;

/// Maximum number of alerts retained after cleanup; unresolved alerts are
/// exempt from this cap
pub const ALERT_CAP: usize = 50;

#[derive(Debug, Default)]
struct StoreInner {
    samples: VecDeque<MetricSample>,
    requests: VecDeque<RequestRecord>,
    alerts: Vec<Alert>,
    total_requests: u64,
    total_errors: u64,
}

/// Thread-safe, bounded, time-ordered storage
#[derive(Debug, Default)]
pub struct SampleStore {
    inner: RwLock<StoreInner>,
}

impl SampleStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one metric sample. No cap at append time; the retention loop
    /// enforces the 24h horizon.
    pub fn append_sample(&self, sample: MetricSample) {
        let mut inner = self.inner.write().unwrap();
        inner.samples.push_back(sample);
    }

    /// Record one completed request. Evicts the oldest detailed records
    /// beyond the 1000-entry cap, but the running totals always increment.
    pub fn record_request(&self, record: RequestRecord) {
        let mut inner = self.inner.write().unwrap();
        inner.total_requests += 1;
        if record.has_error {
            inner.total_errors += 1;
        }
        inner.requests.push_back(record);
        while inner.requests.len() > REQUEST_HISTORY_CAP {
            inner.requests.pop_front();
        }
    }

    /// All metric samples with `timestamp > since`, in arrival order
    pub fn samples_since(&self, since: i64) -> Vec<MetricSample> {
        let inner = self.inner.read().unwrap();
        inner
            .samples
            .iter()
            .filter(|s| s.timestamp > since)
            .cloned()
            .collect()
    }

    /// All request records with `timestamp > since`, in arrival order
    pub fn requests_since(&self, since: i64) -> Vec<RequestRecord> {
        let inner = self.inner.read().unwrap();
        inner
            .requests
            .iter()
            .filter(|r| r.timestamp > since)
            .cloned()
            .collect()
    }

    /// Most recent metric sample, if any has been collected yet
    pub fn latest_sample(&self) -> Option<MetricSample> {
        let inner = self.inner.read().unwrap();
        inner.samples.back().cloned()
    }

    /// Append an alert
    pub fn push_alert(&self, alert: Alert) {
        let mut inner = self.inner.write().unwrap();
        inner.alerts.push(alert);
    }

    /// Copy of the full alert list, in creation order
    pub fn alerts_snapshot(&self) -> Vec<Alert> {
        let inner = self.inner.read().unwrap();
        inner.alerts.clone()
    }

    /// Mark an alert resolved. Returns false if the id is unknown or the
    /// alert was already resolved; `resolved_at` is only ever set once.
    pub fn resolve_alert(&self, id: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        match inner.alerts.iter_mut().find(|a| a.id == id) {
            Some(alert) if !alert.resolved => {
                alert.resolved = true;
                alert.resolved_at = Some(Utc::now().timestamp_millis());
                true
            }
            _ => false,
        }
    }

    /// Running totals of requests and errors since process start
    pub fn totals(&self) -> (u64, u64) {
        let inner = self.inner.read().unwrap();
        (inner.total_requests, inner.total_errors)
    }

    /// Drop samples and request records older than `cutoff`, resolved alerts
    /// created before `cutoff`, and the oldest resolved alerts beyond the
    /// alert cap. Unresolved alerts are never dropped.
    pub fn prune(&self, cutoff: i64) -> PruneReport {
        let mut inner = self.inner.write().unwrap();
        let mut report = PruneReport::default();

        while let Some(front) = inner.samples.front() {
            if front.timestamp < cutoff {
                inner.samples.pop_front();
                report.samples_removed += 1;
            } else {
                break;
            }
        }

        while let Some(front) = inner.requests.front() {
            if front.timestamp < cutoff {
                inner.requests.pop_front();
                report.requests_removed += 1;
            } else {
                break;
            }
        }

        let before = inner.alerts.len();
        inner
            .alerts
            .retain(|a| !a.resolved || a.created_at >= cutoff);

        // Enforce the alert cap by evicting the oldest resolved entries
        while inner.alerts.len() > ALERT_CAP {
            let oldest_resolved = inner
                .alerts
                .iter()
                .enumerate()
                .filter(|(_, a)| a.resolved)
                .min_by_key(|(_, a)| a.created_at)
                .map(|(i, _)| i);
            match oldest_resolved {
                Some(i) => {
                    inner.alerts.remove(i);
                }
                None => break,
            }
        }
        report.alerts_removed = before - inner.alerts.len();

        if report.samples_removed + report.requests_removed + report.alerts_removed > 0 {
            debug!(
                samples = report.samples_removed,
                requests = report.requests_removed,
                alerts = report.alerts_removed,
                "Pruned expired entries"
            );
        }

        report
    }

    /// Snapshot counters for loop logging
    pub fn stats(&self) -> StoreStats {
        let inner = self.inner.read().unwrap();
        StoreStats {
            sample_entries: inner.samples.len(),
            request_entries: inner.requests.len(),
            alert_entries: inner.alerts.len(),
            oldest_sample_timestamp: inner.samples.front().map(|s| s.timestamp),
            newest_sample_timestamp: inner.samples.back().map(|s| s.timestamp),
        }
    }
}

/// Entries removed by one prune pass
#[derive(Debug, Clone, Copy, Default)]
pub struct PruneReport {
    pub samples_removed: usize,
    pub requests_removed: usize,
    pub alerts_removed: usize,
}

/// Store size counters
#[derive(Debug, Clone)]
pub struct StoreStats {
    pub sample_entries: usize,
    pub request_entries: usize,
    pub alert_entries: usize,
    pub oldest_sample_timestamp: Option<i64>,
    pub newest_sample_timestamp: Option<i64>,
}
