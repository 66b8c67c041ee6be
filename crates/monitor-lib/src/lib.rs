//! Runtime health monitoring and alerting
//!
//! This crate provides the core functionality for:
//! - Host CPU/memory/disk sampling on a fixed cadence
//! - Per-request latency and error instrumentation
//! - Threshold-based alert evaluation over rolling windows
//! - Best-effort delivery of high-severity alerts to an external sink
//! - Bounded in-memory retention of all history

pub mod collector;
pub mod error;
pub mod evaluator;
pub mod health;
pub mod models;
pub mod notifier;
pub mod retention;
pub mod service;
pub mod store;

pub use error::MonitorError;
pub use health::HealthAggregator;
pub use models::*;
pub use notifier::{AlertNotifier, AlertSink, LogSink};
pub use service::{MonitorService, ServiceConfig};
pub use store::SampleStore;
