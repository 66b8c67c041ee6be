//! Best-effort alert delivery
//!
//! High-severity alerts are pushed to an external sink (chat bot, pager,
//! email) abstracted behind `AlertSink`. Delivery is fire-and-forget: a
//! failure is logged and discarded, never retried and never surfaced to the
//! evaluator. Medium-severity alerts are recorded but not pushed.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use tracing::warn;

use crate::models::{Alert, AlertSeverity};

/// Outbound delivery target for high-severity alerts
#[async_trait]
pub trait AlertSink: Send + Sync {
    async fn notify(&self, alert: &Alert) -> Result<()>;
}

/// Default sink that writes alerts to the structured log
#[derive(Debug, Default)]
pub struct LogSink;

#[async_trait]
impl AlertSink for LogSink {
    async fn notify(&self, alert: &Alert) -> Result<()> {
        warn!(
            alert_id = %alert.id,
            alert_type = %alert.alert_type,
            severity = %alert.severity,
            message = %format_alert(alert),
            "Alert notification"
        );
        Ok(())
    }
}

/// Human-readable one-line rendering of an alert
pub fn format_alert(alert: &Alert) -> String {
    let created = Utc
        .timestamp_millis_opt(alert.created_at)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| alert.created_at.to_string());
    format!(
        "[{}] {} {}: {}",
        created, alert.severity, alert.alert_type, alert.message
    )
}

/// Dispatches high-severity alerts to the sink without blocking the caller
#[derive(Clone)]
pub struct AlertNotifier {
    sink: Arc<dyn AlertSink>,
}

impl AlertNotifier {
    pub fn new(sink: Arc<dyn AlertSink>) -> Self {
        Self { sink }
    }

    /// Hand a high-severity alert to the sink on a detached task. Medium
    /// alerts are ignored. Delivery errors are logged and dropped.
    pub fn notify_if_high(&self, alert: &Alert) {
        if alert.severity != AlertSeverity::High {
            return;
        }

        let sink = self.sink.clone();
        let alert = alert.clone();
        tokio::spawn(async move {
            if let Err(e) = sink.notify(&alert).await {
                warn!(
                    error = %e,
                    alert_id = %alert.id,
                    "Alert delivery failed, dropping"
                );
            }
        });
    }
}
