//! Host metrics collection
//!
//! This module samples host CPU, memory and disk usage on a fixed cadence
//! and appends one `MetricSample` per tick to the shared store. Probe
//! failures are logged and the tick is skipped; the loop never dies.

mod host;
mod r#loop;

pub use host::HostProbe;
pub use r#loop::CollectionLoop;

use crate::models::MetricSample;
use anyhow::Result;

pub use async_trait::async_trait;

/// Trait for host measurement implementations
#[async_trait]
pub trait SystemProbe: Send + Sync {
    /// Take one measurement of the host
    async fn sample(&self) -> Result<MetricSample>;
}
