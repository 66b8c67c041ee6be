//! Library-boundary errors

use thiserror::Error;

/// Errors returned to synchronous callers. Background loops never surface
/// these; they log and keep running.
#[derive(Debug, Error)]
pub enum MonitorError {
    #[error("alert type is required")]
    MissingAlertType,

    #[error("alert message is required")]
    MissingAlertMessage,
}
