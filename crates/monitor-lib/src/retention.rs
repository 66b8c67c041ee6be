//! History retention
//!
//! The only component allowed to delete data outright. On each tick it drops
//! samples and request records older than the horizon, resolved alerts older
//! than the horizon, and resolved alerts beyond the list cap. Unresolved
//! alerts are never dropped.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::interval;
use tracing::{debug, info};

use crate::store::{PruneReport, SampleStore};

/// Periodically prunes expired history from the store
pub struct RetentionLoop {
    store: Arc<SampleStore>,
    period: Duration,
    horizon: Duration,
}

impl RetentionLoop {
    pub fn new(store: Arc<SampleStore>, period: Duration, horizon: Duration) -> Self {
        Self {
            store,
            period,
            horizon,
        }
    }

    /// Run until a shutdown signal arrives
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            period_secs = self.period.as_secs(),
            horizon_secs = self.horizon.as_secs(),
            "Starting retention loop"
        );

        let mut ticker = interval(self.period);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.prune_once();
                    debug!(
                        samples = report.samples_removed,
                        requests = report.requests_removed,
                        alerts = report.alerts_removed,
                        "Retention cycle complete"
                    );
                }
                _ = shutdown.recv() => {
                    info!("Shutting down retention loop");
                    break;
                }
            }
        }
    }

    /// One prune pass against the horizon ending now
    pub fn prune_once(&self) -> PruneReport {
        let cutoff = Utc::now().timestamp_millis() - self.horizon.as_millis() as i64;
        self.store.prune(cutoff)
    }
}
