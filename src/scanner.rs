//! Scan orchestration: resolve the target once, fan out one probe task per
//! port, fan back in, classify open ports, and produce an ordered report.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use ::time::{format_description::well_known, OffsetDateTime};

use crate::catalog;
use crate::classify;
use crate::prober;
use crate::resolve;
use crate::types::{ProbeOutcome, ScanReport, ScanTarget, ThreatRecord};

/// Snippet cap applied before a banner lands in a report.
const MAX_SNIPPET_LEN: usize = 120;

/// Shared counters a caller can watch while a scan is in flight.
#[derive(Clone, Debug)]
pub struct ScanProgress {
    pub probes_issued: Arc<AtomicU64>,
    pub open_count: Arc<AtomicU64>,
}

impl ScanProgress {
    pub fn new() -> Self {
        Self {
            probes_issued: Arc::new(AtomicU64::new(0)),
            open_count: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for ScanProgress {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan the target's ports concurrently and return an ordered report.
///
/// - Resolution failure short-circuits: the report carries
///   `resolution_error`, `records` stays empty, and no probe is issued.
/// - Each probe is independently time-boxed; a refused, timed-out, or
///   failed port never cancels or starves its siblings.
/// - `records` is sorted by ascending port regardless of completion order.
pub async fn scan(target: &ScanTarget) -> ScanReport {
    scan_internal(target, CancellationToken::new(), ScanProgress::new()).await
}

/// Variant that accepts a `CancellationToken`, letting the caller impose a
/// global deadline by cancelling from outside. Probes not yet started are
/// skipped; in-flight probes still run to their own timeouts.
pub async fn scan_with_cancel(target: &ScanTarget, cancel: CancellationToken) -> ScanReport {
    scan_internal(target, cancel, ScanProgress::new()).await
}

/// Variant that also exposes live progress counters.
pub async fn scan_with_progress(
    target: &ScanTarget,
    cancel: CancellationToken,
    progress: ScanProgress,
) -> ScanReport {
    scan_internal(target, cancel, progress).await
}

async fn scan_internal(
    target: &ScanTarget,
    cancel: CancellationToken,
    progress: ScanProgress,
) -> ScanReport {
    let started_at = now_rfc3339();
    let start = Instant::now();

    let addr = match resolve::resolve_host(&target.host).await {
        Ok(addr) => addr,
        Err(e) => {
            error!(host = %target.host, "DNS resolution failed: {e}");
            return ScanReport {
                target: target.host.clone(),
                started_at,
                duration_ms: start.elapsed().as_millis() as u64,
                records: Vec::new(),
                resolution_error: Some(e.to_string()),
            };
        }
    };

    // A port may appear only once in the report, however often it was
    // requested. Dedup up front, preserving first-appearance order.
    let mut seen = HashSet::new();
    let ports: Vec<u16> = target
        .ports
        .iter()
        .copied()
        .filter(|p| seen.insert(*p))
        .collect();

    info!(host = %target.host, %addr, ports = ports.len(), "initiating scan");

    let cap = target
        .concurrency
        .unwrap_or_else(|| ports.len().max(1))
        .clamp(1, 1024);
    let sem = Arc::new(Semaphore::new(cap));
    let mut set: JoinSet<Option<ProbeOutcome>> = JoinSet::new();

    for port in ports {
        if cancel.is_cancelled() {
            break;
        }
        let permit = sem
            .clone()
            .acquire_owned()
            .await
            .expect("semaphore in scope");
        let cancel = cancel.clone();
        let probes_issued = progress.probes_issued.clone();
        let connect_timeout = target.connect_timeout;
        let banner_timeout = target.banner_timeout;

        set.spawn(async move {
            let _permit = permit; // held until the probe completes

            if cancel.is_cancelled() {
                return None;
            }
            probes_issued.fetch_add(1, Ordering::Relaxed);
            Some(prober::probe(addr, port, connect_timeout, banner_timeout).await)
        });
    }

    let mut records: Vec<ThreatRecord> = Vec::new();
    while let Some(res) = set.join_next().await {
        let outcome = match res {
            Ok(Some(outcome)) => outcome,
            Ok(None) => continue,
            Err(e) => {
                warn!("probe task failed to complete: {e}");
                continue;
            }
        };

        if let Some(err) = &outcome.error {
            warn!(port = outcome.port, "unexpected error on port: {err}");
            continue;
        }
        if !outcome.open {
            continue;
        }

        progress.open_count.fetch_add(1, Ordering::Relaxed);
        let service = catalog::service_name(outcome.port);
        let threat = classify::classify(outcome.port, outcome.banner.as_deref());
        warn!(
            port = outcome.port,
            service,
            threat = %threat,
            "open port discovered"
        );
        records.push(ThreatRecord {
            port: outcome.port,
            service: service.to_string(),
            banner_snippet: banner_snippet(outcome.banner.as_deref()),
            threat,
        });
    }

    // Fan-in is completion-ordered; the report contract is port-ordered.
    records.sort_unstable_by_key(|r| r.port);

    let duration_ms = start.elapsed().as_millis() as u64;
    info!(
        host = %target.host,
        open = records.len(),
        duration_ms,
        "scan completed"
    );

    ScanReport {
        target: target.host.clone(),
        started_at,
        duration_ms,
        records,
        resolution_error: None,
    }
}

/// Trim and bound a captured banner for reporting; `"N/A"` when none.
fn banner_snippet(banner: Option<&str>) -> String {
    let Some(banner) = banner else {
        return "N/A".to_string();
    };
    let trimmed = banner.trim();
    if trimmed.is_empty() {
        return "N/A".to_string();
    }
    let mut snippet: String = trimmed.chars().take(MAX_SNIPPET_LEN).collect();
    if snippet.len() < trimmed.len() {
        snippet.push('…');
    }
    snippet
}

fn now_rfc3339() -> String {
    OffsetDateTime::now_utc()
        .format(&well_known::Rfc3339)
        .unwrap_or_else(|_| String::from("1970-01-01T00:00:00Z"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_is_na_for_missing_or_blank() {
        assert_eq!(banner_snippet(None), "N/A");
        assert_eq!(banner_snippet(Some("   \r\n")), "N/A");
    }

    #[test]
    fn snippet_trims_surrounding_whitespace() {
        assert_eq!(banner_snippet(Some("SSH-2.0-OpenSSH\r\n")), "SSH-2.0-OpenSSH");
    }

    #[test]
    fn snippet_is_bounded() {
        let long = "x".repeat(5 * MAX_SNIPPET_LEN);
        let snippet = banner_snippet(Some(&long));
        assert_eq!(snippet.chars().count(), MAX_SNIPPET_LEN + 1);
        assert!(snippet.ends_with('…'));
    }

    #[test]
    fn timestamp_is_rfc3339() {
        let ts = now_rfc3339();
        assert!(ts.contains('T'));
        assert!(OffsetDateTime::parse(&ts, &well_known::Rfc3339).is_ok());
    }
}
