//! Service lifecycle
//!
//! One `MonitorService` owns the store and the three background loops. The
//! process entry point constructs it, calls `start()` and calls `stop()` on
//! shutdown; there is no module-level singleton.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::Utc;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::collector::{CollectionLoop, SystemProbe};
use crate::evaluator::{AlertEvaluator, EvaluationLoop};
use crate::health::HealthAggregator;
use crate::models::{RequestRecord, Thresholds};
use crate::notifier::{AlertNotifier, AlertSink};
use crate::retention::RetentionLoop;
use crate::store::SampleStore;

/// Cadences and thresholds for the background loops
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Metrics collection period (default 30s)
    pub collection_period: Duration,
    /// Alert evaluation period (default 5 minutes)
    pub evaluation_period: Duration,
    /// Retention prune period (default 1 hour)
    pub retention_period: Duration,
    /// Rolling window for alert aggregates and health metrics (default 1 hour)
    pub evaluation_window: Duration,
    /// Age beyond which samples and resolved alerts are dropped (default 24h)
    pub retention_horizon: Duration,
    pub thresholds: Thresholds,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            collection_period: Duration::from_secs(30),
            evaluation_period: Duration::from_secs(5 * 60),
            retention_period: Duration::from_secs(60 * 60),
            evaluation_window: Duration::from_secs(60 * 60),
            retention_horizon: Duration::from_secs(24 * 60 * 60),
            thresholds: Thresholds::default(),
        }
    }
}

/// The monitoring service: shared store, background loops, query surface
pub struct MonitorService {
    config: ServiceConfig,
    store: Arc<SampleStore>,
    probe: Arc<dyn SystemProbe>,
    notifier: AlertNotifier,
    aggregator: Arc<HealthAggregator>,
    shutdown_tx: broadcast::Sender<()>,
    handles: Mutex<Vec<JoinHandle<()>>>,
}

impl MonitorService {
    pub fn new(config: ServiceConfig, probe: Arc<dyn SystemProbe>, sink: Arc<dyn AlertSink>) -> Self {
        let store = Arc::new(SampleStore::new());
        let notifier = AlertNotifier::new(sink);
        let aggregator = Arc::new(HealthAggregator::new(
            store.clone(),
            notifier.clone(),
            config.evaluation_window,
        ));
        let (shutdown_tx, _) = broadcast::channel(1);

        Self {
            config,
            store,
            probe,
            notifier,
            aggregator,
            shutdown_tx,
            handles: Mutex::new(Vec::new()),
        }
    }

    pub fn store(&self) -> Arc<SampleStore> {
        self.store.clone()
    }

    pub fn aggregator(&self) -> Arc<HealthAggregator> {
        self.aggregator.clone()
    }

    /// Instrumentation hook invoked by the HTTP layer once per completed
    /// request. O(1): appends only, no evaluation, no notification.
    pub fn record_request(&self, elapsed_millis: u64, has_error: bool) {
        self.store.record_request(RequestRecord {
            timestamp: Utc::now().timestamp_millis(),
            response_time_millis: elapsed_millis,
            has_error,
        });
    }

    /// Spawn the collection, evaluation and retention loops
    pub fn start(&self) {
        let mut handles = self.handles.lock().unwrap();
        if !handles.is_empty() {
            warn!("Monitor service already started");
            return;
        }

        info!("Starting monitor service");

        let collection = CollectionLoop::new(
            self.probe.clone(),
            self.store.clone(),
            self.config.collection_period,
        );
        handles.push(tokio::spawn(collection.run(self.shutdown_tx.subscribe())));

        let evaluator = AlertEvaluator::new(
            self.store.clone(),
            self.config.thresholds,
            self.config.evaluation_window,
        );
        let evaluation = EvaluationLoop::new(
            evaluator,
            self.store.clone(),
            self.notifier.clone(),
            self.config.evaluation_period,
        );
        handles.push(tokio::spawn(evaluation.run(self.shutdown_tx.subscribe())));

        let retention = RetentionLoop::new(
            self.store.clone(),
            self.config.retention_period,
            self.config.retention_horizon,
        );
        handles.push(tokio::spawn(retention.run(self.shutdown_tx.subscribe())));
    }

    /// Signal the loops to stop and wait for in-flight ticks to finish
    pub async fn stop(&self) {
        let drained: Vec<JoinHandle<()>> = {
            let mut handles = self.handles.lock().unwrap();
            handles.drain(..).collect()
        };
        if drained.is_empty() {
            return;
        }

        info!("Stopping monitor service");
        let _ = self.shutdown_tx.send(());

        for handle in drained {
            let _ = handle.await;
        }
    }
}
