//! Monitor configuration

use std::time::Duration;

use anyhow::Result;
use monitor_lib::{ServiceConfig, Thresholds};
use serde::Deserialize;

/// Process configuration, read once at startup
#[derive(Debug, Clone, Deserialize)]
pub struct MonitorConfig {
    /// API server port for health/stats endpoints
    #[serde(default = "default_api_port")]
    pub api_port: u16,

    /// Metrics collection interval in seconds
    #[serde(default = "default_collection_interval")]
    pub collection_interval_secs: u64,

    /// Alert evaluation interval in seconds
    #[serde(default = "default_evaluation_interval")]
    pub evaluation_interval_secs: u64,

    /// Retention prune interval in seconds
    #[serde(default = "default_retention_interval")]
    pub retention_interval_secs: u64,

    /// Rolling window for alert aggregates in seconds
    #[serde(default = "default_evaluation_window")]
    pub evaluation_window_secs: u64,

    /// Retention horizon in seconds
    #[serde(default = "default_retention_horizon")]
    pub retention_horizon_secs: u64,

    /// Alert thresholds
    #[serde(default)]
    pub thresholds: Thresholds,
}

fn default_api_port() -> u16 {
    8080
}

fn default_collection_interval() -> u64 {
    30
}

fn default_evaluation_interval() -> u64 {
    5 * 60
}

fn default_retention_interval() -> u64 {
    60 * 60
}

fn default_evaluation_window() -> u64 {
    60 * 60
}

fn default_retention_horizon() -> u64 {
    24 * 60 * 60
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            api_port: default_api_port(),
            collection_interval_secs: default_collection_interval(),
            evaluation_interval_secs: default_evaluation_interval(),
            retention_interval_secs: default_retention_interval(),
            evaluation_window_secs: default_evaluation_window(),
            retention_horizon_secs: default_retention_horizon(),
            thresholds: Thresholds::default(),
        }
    }
}

impl MonitorConfig {
    /// Load configuration from the environment
    pub fn load() -> Result<Self> {
        let config = config::Config::builder()
            .add_source(config::Environment::with_prefix("MONITOR"))
            .build()?;

        Ok(config.try_deserialize().unwrap_or_default())
    }

    /// Loop cadences and thresholds for the service
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            collection_period: Duration::from_secs(self.collection_interval_secs),
            evaluation_period: Duration::from_secs(self.evaluation_interval_secs),
            retention_period: Duration::from_secs(self.retention_interval_secs),
            evaluation_window: Duration::from_secs(self.evaluation_window_secs),
            retention_horizon: Duration::from_secs(self.retention_horizon_secs),
            thresholds: self.thresholds,
        }
    }
}
