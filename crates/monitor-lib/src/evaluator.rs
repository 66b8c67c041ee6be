//! Threshold alert evaluation
//!
//! Four independent checks run on a fixed cadence, each aggregating the
//! trailing window of samples or request records. A check with an empty
//! window is skipped. Comparisons are strict: an aggregate exactly at the
//! threshold does not raise.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info};

use crate::models::{Alert, AlertSeverity, AlertType, Thresholds};
use crate::notifier::AlertNotifier;
use crate::store::SampleStore;

/// Computes rolling-window aggregates and raises alerts on breaches
pub struct AlertEvaluator {
    store: Arc<SampleStore>,
    thresholds: Thresholds,
    window: Duration,
}

impl AlertEvaluator {
    pub fn new(store: Arc<SampleStore>, thresholds: Thresholds, window: Duration) -> Self {
        Self {
            store,
            thresholds,
            window,
        }
    }

    /// Run all checks against the window ending now
    pub fn evaluate(&self) -> Vec<Alert> {
        self.evaluate_at(Utc::now().timestamp_millis())
    }

    /// Run all checks against the window ending at `now`
    pub fn evaluate_at(&self, now: i64) -> Vec<Alert> {
        let since = now - self.window.as_millis() as i64;
        let samples = self.store.samples_since(since);
        let requests = self.store.requests_since(since);

        let mut raised = Vec::new();

        if !samples.is_empty() {
            let count = samples.len() as f64;
            let cpu_mean = samples.iter().map(|s| s.cpu_percent).sum::<f64>() / count;
            if cpu_mean > self.thresholds.cpu_percent && self.should_raise(AlertType::HighCpuUsage)
            {
                raised.push(Alert::new(
                    AlertType::HighCpuUsage.to_string(),
                    format!(
                        "Average CPU usage at {:.1}% exceeds {:.0}% threshold",
                        cpu_mean, self.thresholds.cpu_percent
                    ),
                    AlertSeverity::High,
                ));
            }

            let mem_mean = samples.iter().map(|s| s.memory_used_percent()).sum::<f64>() / count;
            if mem_mean > self.thresholds.memory_percent
                && self.should_raise(AlertType::HighMemoryUsage)
            {
                raised.push(Alert::new(
                    AlertType::HighMemoryUsage.to_string(),
                    format!(
                        "Average memory usage at {:.1}% exceeds {:.0}% threshold",
                        mem_mean, self.thresholds.memory_percent
                    ),
                    AlertSeverity::High,
                ));
            }
        }

        if !requests.is_empty() {
            let count = requests.len() as f64;
            let rt_mean = requests
                .iter()
                .map(|r| r.response_time_millis as f64)
                .sum::<f64>()
                / count;
            if rt_mean > self.thresholds.response_time_millis
                && self.should_raise(AlertType::SlowResponseTime)
            {
                raised.push(Alert::new(
                    AlertType::SlowResponseTime.to_string(),
                    format!(
                        "Average response time at {:.0}ms exceeds {:.0}ms threshold",
                        rt_mean, self.thresholds.response_time_millis
                    ),
                    AlertSeverity::Medium,
                ));
            }

            let errors = requests.iter().filter(|r| r.has_error).count() as f64;
            let error_rate = errors / count * 100.0;
            if error_rate > self.thresholds.error_rate_percent
                && self.should_raise(AlertType::HighErrorRate)
            {
                raised.push(Alert::new(
                    AlertType::HighErrorRate.to_string(),
                    format!(
                        "Error rate at {:.1}% exceeds {:.0}% threshold",
                        error_rate, self.thresholds.error_rate_percent
                    ),
                    AlertSeverity::High,
                ));
            }
        }

        raised
    }

    /// Single decision point for whether a breached check raises again.
    ///
    /// A persisting condition raises a fresh alert on every tick. A future
    /// debounce policy (suppress while an unresolved alert of the same type
    /// exists) only needs to change this function.
    fn should_raise(&self, _alert_type: AlertType) -> bool {
        true
    }
}

/// Periodically evaluates and publishes raised alerts
pub struct EvaluationLoop {
    evaluator: AlertEvaluator,
    store: Arc<SampleStore>,
    notifier: AlertNotifier,
    period: Duration,
}

impl EvaluationLoop {
    pub fn new(
        evaluator: AlertEvaluator,
        store: Arc<SampleStore>,
        notifier: AlertNotifier,
        period: Duration,
    ) -> Self {
        Self {
            evaluator,
            store,
            notifier,
            period,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            period_secs = self.period.as_secs(),
            "Starting alert evaluation loop"
        );

        let mut ticker = interval(self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.evaluate_once();
                }
                _ = shutdown.recv() => {
                    info!("Shutting down alert evaluation loop");
                    break;
                }
            }
        }
    }

    /// One evaluation tick: append every raised alert and push high-severity
    /// ones to the notifier
    pub fn evaluate_once(&self) {
        let raised = self.evaluator.evaluate();
        if raised.is_empty() {
            debug!("Evaluation tick raised no alerts");
            return;
        }

        for alert in raised {
            info!(
                alert_id = %alert.id,
                alert_type = %alert.alert_type,
                severity = %alert.severity,
                "Alert raised"
            );
            self.notifier.notify_if_high(&alert);
            self.store.push_alert(alert);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MetricSample, RequestRecord};
    use crate::notifier::AlertSink;
    use anyhow::Result;
    use async_trait::async_trait;

    struct NullSink;

    #[async_trait]
    impl AlertSink for NullSink {
        async fn notify(&self, _alert: &Alert) -> Result<()> {
            Ok(())
        }
    }

    fn evaluator(store: Arc<SampleStore>) -> AlertEvaluator {
        AlertEvaluator::new(store, Thresholds::default(), Duration::from_secs(3600))
    }

    fn cpu_sample(timestamp: i64, cpu: f64) -> MetricSample {
        MetricSample {
            timestamp,
            cpu_percent: cpu,
            memory_total_bytes: 8_000_000_000,
            memory_used_bytes: 4_000_000_000,
            memory_free_percent: 50.0,
            disk_total_bytes: 100_000_000_000,
            disk_used_bytes: 40_000_000_000,
            disk_usage_percent: 40.0,
        }
    }

    fn memory_sample(timestamp: i64, used_percent: f64) -> MetricSample {
        MetricSample {
            memory_free_percent: 100.0 - used_percent,
            ..cpu_sample(timestamp, 10.0)
        }
    }

    fn request(timestamp: i64, response_time_millis: u64, has_error: bool) -> RequestRecord {
        RequestRecord {
            timestamp,
            response_time_millis,
            has_error,
        }
    }

    #[test]
    fn test_high_cpu_raises_exactly_one_alert() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        for i in 0..5 {
            store.append_sample(cpu_sample(now - 1000 * (5 - i), 90.0));
        }

        let raised = evaluator(store).evaluate_at(now);

        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, "HIGH_CPU_USAGE");
        assert_eq!(raised[0].severity, AlertSeverity::High);
        assert!(raised[0].message.contains("90"));
    }

    #[test]
    fn test_threshold_comparison_is_strict() {
        let now = Utc::now().timestamp_millis();

        let store = Arc::new(SampleStore::new());
        store.append_sample(cpu_sample(now - 1000, 80.0));
        assert!(evaluator(store).evaluate_at(now).is_empty());

        let store = Arc::new(SampleStore::new());
        store.append_sample(cpu_sample(now - 1000, 80.01));
        let raised = evaluator(store).evaluate_at(now);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_empty_window_raises_nothing() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();

        // Sample outside the window is invisible to the checks
        store.append_sample(cpu_sample(now - 2 * 3600 * 1000, 99.0));

        assert!(evaluator(store).evaluate_at(now).is_empty());
    }

    #[test]
    fn test_memory_check_uses_used_percent() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        store.append_sample(memory_sample(now - 1000, 86.0));

        let raised = evaluator(store).evaluate_at(now);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, "HIGH_MEMORY_USAGE");
    }

    #[test]
    fn test_slow_response_time_is_medium_severity() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        store.record_request(request(now - 1000, 6000, false));

        let raised = evaluator(store).evaluate_at(now);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, "SLOW_RESPONSE_TIME");
        assert_eq!(raised[0].severity, AlertSeverity::Medium);
    }

    #[test]
    fn test_error_rate_check() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        // 2 errors out of 10 = 20%
        for i in 0..10 {
            store.record_request(request(now - 1000 - i, 100, i < 2));
        }

        let raised = evaluator(store).evaluate_at(now);
        assert_eq!(raised.len(), 1);
        assert_eq!(raised[0].alert_type, "HIGH_ERROR_RATE");
        assert_eq!(raised[0].severity, AlertSeverity::High);
    }

    #[test]
    fn test_persisting_condition_raises_every_tick() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        store.append_sample(cpu_sample(now - 1000, 95.0));

        let evaluator = evaluator(store);
        let first = evaluator.evaluate_at(now);
        let second = evaluator.evaluate_at(now);

        assert_eq!(first.len(), 1);
        assert_eq!(second.len(), 1);
        assert_ne!(first[0].id, second[0].id);
    }

    #[tokio::test]
    async fn test_evaluate_once_appends_to_store() {
        let store = Arc::new(SampleStore::new());
        let now = Utc::now().timestamp_millis();
        store.append_sample(cpu_sample(now - 1000, 95.0));

        let eval_loop = EvaluationLoop::new(
            evaluator(store.clone()),
            store.clone(),
            AlertNotifier::new(Arc::new(NullSink)),
            Duration::from_secs(300),
        );

        eval_loop.evaluate_once();

        let alerts = store.alerts_snapshot();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "HIGH_CPU_USAGE");
    }
}
