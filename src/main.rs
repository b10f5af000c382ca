use std::fs::File;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use host_sentinel_rs::alerts::{self, ConsoleAlertSink, LogIncidentStore};
use host_sentinel_rs::ports;
use host_sentinel_rs::resolve;
use host_sentinel_rs::scanner;
use host_sentinel_rs::types::{ScanReport, ScanTarget};

/// host-sentinel-rs — async TCP recon of a single host with banner grabbing
/// and threat classification.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "host-sentinel-rs",
    version,
    about = "Async TCP recon of a single host with banner grabbing and threat classification.",
    long_about = None
)]
struct Cli {
    /// Target host: name or IP address.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Ports to scan: inline list like "22,80,8000-8010" or a path to a
    /// ports file. Defaults to the threat catalog's ports.
    #[arg(long)]
    ports: Option<String>,

    /// TCP connect timeout in milliseconds.
    #[arg(long = "connect-timeout-ms", default_value_t = 1000)]
    connect_timeout_ms: u64,

    /// Banner read timeout in milliseconds.
    #[arg(long = "banner-timeout-ms", default_value_t = 500)]
    banner_timeout_ms: u64,

    /// Max concurrent probes. Defaults to one task per port.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Write the report as pretty JSON to this path (optional).
    #[arg(long)]
    output: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let port_list = ports::resolve_ports_arg(cli.ports.as_deref())?;

    let mut target = ScanTarget::new(cli.host.clone())
        .with_ports(port_list)
        .with_timeouts(
            Duration::from_millis(cli.connect_timeout_ms),
            Duration::from_millis(cli.banner_timeout_ms),
        );
    if let Some(cap) = cli.concurrency {
        target = target.with_concurrency(cap);
    }

    let report = scanner::scan(&target).await;

    if let Some(err) = &report.resolution_error {
        eprintln!("Scan aborted: {err}");
    } else {
        // Annotate IP targets with their PTR name when one exists.
        if let Ok(ip) = report.target.parse::<std::net::IpAddr>() {
            if let Some(name) = resolve::reverse_dns(ip).await {
                println!("Target {} resolves back to {name}", report.target);
            }
        }
        print_report_table(&report);
        alerts::dispatch_report(&report, &ConsoleAlertSink, &LogIncidentStore);
    }

    if let Some(path) = cli.output.as_deref() {
        if let Err(e) = write_report_json(path, &report) {
            eprintln!("Failed to write JSON to {}: {}", path.display(), e);
        } else {
            println!("Wrote JSON report to {}", path.display());
        }
    }

    Ok(())
}

fn print_report_table(report: &ScanReport) {
    let mut service_w = "service".len();
    let mut threat_w = "threat".len();
    let mut banner_w = "banner".len();
    for r in &report.records {
        service_w = service_w.max(r.service.len());
        threat_w = threat_w.max(r.threat.len());
        banner_w = banner_w.max(r.banner_snippet.len().min(60));
    }
    let port_w = "port".len();

    println!(
        "\nOpen ports on {}: {} (scan took {} ms)",
        report.target,
        report.records.len(),
        report.duration_ms
    );
    println!(
        "{:>port_w$}  {:<service_w$}  {:<threat_w$}  {:<banner_w$}",
        "port", "service", "threat", "banner"
    );
    println!(
        "{:-<port_w$}  {:-<service_w$}  {:-<threat_w$}  {:-<banner_w$}",
        "", "", "", ""
    );
    for r in &report.records {
        let bsnip: String = r.banner_snippet.chars().take(60).collect();
        println!(
            "{:>port_w$}  {:<service_w$}  {:<threat_w$}  {:<banner_w$}",
            r.port, r.service, r.threat, bsnip
        );
    }
}

fn write_report_json(path: &std::path::Path, report: &ScanReport) -> Result<()> {
    let file = File::create(path)?;
    serde_json::to_writer_pretty(file, report)?;
    Ok(())
}
