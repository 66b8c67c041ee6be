//! sysinfo-backed host probe

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sysinfo::{Disks, System};
use tracing::warn;

use super::SystemProbe;
use crate::models::MetricSample;

/// Probe reading host CPU, memory and disk usage via sysinfo
#[derive(Debug, Default)]
pub struct HostProbe;

impl HostProbe {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl SystemProbe for HostProbe {
    async fn sample(&self) -> Result<MetricSample> {
        let mut sys = System::new();

        // CPU usage needs two refreshes separated by the minimum update
        // interval to produce a utilization delta
        sys.refresh_cpu_usage();
        tokio::time::sleep(sysinfo::MINIMUM_CPU_UPDATE_INTERVAL).await;
        sys.refresh_cpu_usage();
        sys.refresh_memory();

        let cpu_percent = (sys.global_cpu_info().cpu_usage() as f64).clamp(0.0, 100.0);

        let memory_total_bytes = sys.total_memory();
        let memory_available_bytes = sys.available_memory();
        let memory_used_bytes = memory_total_bytes.saturating_sub(memory_available_bytes);
        let memory_free_percent = if memory_total_bytes > 0 {
            memory_available_bytes as f64 / memory_total_bytes as f64 * 100.0
        } else {
            0.0
        };

        let (disk_total_bytes, disk_used_bytes, disk_usage_percent) = working_volume_usage();

        Ok(MetricSample {
            timestamp: Utc::now().timestamp_millis(),
            cpu_percent,
            memory_total_bytes,
            memory_used_bytes,
            memory_free_percent,
            disk_total_bytes,
            disk_used_bytes,
            disk_usage_percent,
        })
    }
}

/// Usage of the working volume, best-effort.
///
/// Picks the largest mounted disk as the working volume. If no disks are
/// visible the sample records zeros with a non-fatal warning.
fn working_volume_usage() -> (u64, u64, f64) {
    let disks = Disks::new_with_refreshed_list();

    let largest = disks
        .list()
        .iter()
        .max_by_key(|d| d.total_space())
        .filter(|d| d.total_space() > 0);

    match largest {
        Some(disk) => {
            let total = disk.total_space();
            let used = total.saturating_sub(disk.available_space());
            let percent = used as f64 / total as f64 * 100.0;
            (total, used, percent)
        }
        None => {
            warn!("No disks visible to the probe, recording zero disk usage");
            (0, 0, 0.0)
        }
    }
}
