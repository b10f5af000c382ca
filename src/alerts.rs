//! Outbound collaborators: the alert sink and the incident store. Both are
//! best-effort; the scanner core never depends on delivery succeeding.

use thiserror::Error;
use tracing::{info, warn};

use crate::types::ScanReport;

#[derive(Debug, Error)]
#[error("alert delivery failed: {0}")]
pub struct DeliveryError(pub String);

/// Fire-and-forget notification channel. No delivery guarantee.
pub trait AlertSink: Send + Sync {
    fn notify(&self, threat: &str) -> Result<(), DeliveryError>;
}

/// Sink of finished findings. Persistence format is the store's business.
pub trait IncidentStore: Send + Sync {
    fn add_incident(&self, description: &str, kind: &str, severity: &str, source: &str);
}

/// Console-backed sink standing in for a real notification transport.
pub struct ConsoleAlertSink;

impl AlertSink for ConsoleAlertSink {
    fn notify(&self, threat: &str) -> Result<(), DeliveryError> {
        println!("ALERT: {threat} detected! Notification sent.");
        println!("Simulating email: Subject: Security Alert - {threat}");
        Ok(())
    }
}

/// Store that records incidents to the log only.
pub struct LogIncidentStore;

impl IncidentStore for LogIncidentStore {
    fn add_incident(&self, description: &str, kind: &str, severity: &str, source: &str) {
        info!(kind, severity, source, "incident recorded: {description}");
    }
}

/// Forward every finding in a report to the sink and store. Delivery
/// failures are logged and swallowed; dispatch never fails the caller.
pub fn dispatch_report(report: &ScanReport, sink: &dyn AlertSink, store: &dyn IncidentStore) {
    for record in &report.records {
        if let Err(e) = sink.notify(&record.threat) {
            warn!(port = record.port, "alert not delivered: {e}");
        }
        store.add_incident(&record.threat, "network", "warning", &report.target);
    }
}
