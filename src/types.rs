use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::catalog;

/// Default bound on one TCP connect attempt.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_millis(1000);
/// Default bound on the passive banner read after a successful connect.
/// Deliberately shorter than the connect timeout.
pub const DEFAULT_BANNER_TIMEOUT: Duration = Duration::from_millis(500);

/// Immutable description of one scan invocation: the host to probe, which
/// ports, and the per-probe time bounds.
#[derive(Debug, Clone)]
pub struct ScanTarget {
    pub host: String,
    pub ports: Vec<u16>,
    pub connect_timeout: Duration,
    pub banner_timeout: Duration,
    /// Optional cap on concurrent probes. `None` means one task per port,
    /// which is fine for catalog-sized port lists.
    pub concurrency: Option<usize>,
}

impl ScanTarget {
    /// Target with the default catalog ports and default timeouts.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            ports: catalog::default_ports(),
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            banner_timeout: DEFAULT_BANNER_TIMEOUT,
            concurrency: None,
        }
    }

    pub fn with_ports(mut self, ports: Vec<u16>) -> Self {
        self.ports = ports;
        self
    }

    pub fn with_timeouts(mut self, connect: Duration, banner: Duration) -> Self {
        self.connect_timeout = connect;
        self.banner_timeout = banner;
        self
    }

    pub fn with_concurrency(mut self, cap: usize) -> Self {
        self.concurrency = Some(cap);
        self
    }
}

/// Failure inside a single probe that is neither "closed" nor "no banner".
/// Contained to its port; never aborts sibling probes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProbeError {
    #[error("unexpected probe error: {0}")]
    Unexpected(String),
}

/// Result of probing one port. Created once per port per scan, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    pub port: u16,
    pub open: bool,
    pub banner: Option<String>,
    pub error: Option<ProbeError>,
}

impl ProbeOutcome {
    /// Refused or timed-out connect. An expected outcome, not an error.
    pub fn closed(port: u16) -> Self {
        Self {
            port,
            open: false,
            banner: None,
            error: None,
        }
    }

    pub fn open(port: u16, banner: Option<String>) -> Self {
        Self {
            port,
            open: true,
            banner,
            error: None,
        }
    }

    pub fn failed(port: u16, open: bool, error: ProbeError) -> Self {
        Self {
            port,
            open,
            banner: None,
            error: Some(error),
        }
    }
}

/// One classified finding for an open port.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ThreatRecord {
    pub port: u16,
    pub service: String,
    /// Trimmed, bounded banner excerpt; `"N/A"` when nothing was captured.
    pub banner_snippet: String,
    pub threat: String,
}

/// Aggregate result of one scan, ordered by ascending port.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
pub struct ScanReport {
    pub target: String,
    pub started_at: String,
    pub duration_ms: u64,
    pub records: Vec<ThreatRecord>,
    /// Set when the host could not be resolved; implies `records` is empty.
    pub resolution_error: Option<String>,
}
