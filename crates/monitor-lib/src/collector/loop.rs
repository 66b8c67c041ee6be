//! Metrics collection loop

use std::sync::Arc;
use std::time::Duration;

use tokio::time::interval;
use tracing::{debug, info, warn};

use super::SystemProbe;
use crate::store::SampleStore;

/// Periodically samples the host and appends to the store
pub struct CollectionLoop {
    probe: Arc<dyn SystemProbe>,
    store: Arc<SampleStore>,
    period: Duration,
}

impl CollectionLoop {
    pub fn new(probe: Arc<dyn SystemProbe>, store: Arc<SampleStore>, period: Duration) -> Self {
        Self {
            probe,
            store,
            period,
        }
    }

    /// Run until a shutdown signal arrives. An in-flight tick completes
    /// before the loop exits.
    pub async fn run(self, mut shutdown: tokio::sync::broadcast::Receiver<()>) {
        info!(
            period_secs = self.period.as_secs(),
            "Starting metrics collection loop"
        );

        let mut ticker = interval(self.period);
        let mut tick_count = 0u64;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.collect_once().await;
                    tick_count += 1;

                    // Log store stats every 10 ticks (5 minutes at 30s)
                    if tick_count % 10 == 0 {
                        let stats = self.store.stats();
                        debug!(
                            samples = stats.sample_entries,
                            requests = stats.request_entries,
                            alerts = stats.alert_entries,
                            "Collection cycle stats"
                        );
                    }
                }
                _ = shutdown.recv() => {
                    info!("Shutting down metrics collection loop");
                    break;
                }
            }
        }
    }

    /// One collection tick. A probe failure is logged and skipped.
    pub async fn collect_once(&self) {
        match self.probe.sample().await {
            Ok(sample) => {
                self.store.append_sample(sample);
            }
            Err(e) => {
                warn!(error = %e, "Metrics collection failed, skipping tick");
            }
        }
    }
}
