use anyhow::{bail, Context, Result};
use std::fs;
use std::path::Path;

use crate::catalog;

/// Parse a port specification into a deduplicated list of TCP ports
/// (1..=65535), preserving first-appearance order.
///
/// Ports are separated by commas or newlines. Per item:
/// - single port: `80`
/// - inclusive range: `8000-8010`
/// - comments: everything after `#` is ignored
/// - blank items and whitespace are ignored
pub fn parse_ports_str(s: &str) -> Result<Vec<u16>> {
    let mut out: Vec<u16> = Vec::new();
    let mut seen = std::collections::HashSet::new();

    for raw_line in s.lines() {
        let line = raw_line.split('#').next().unwrap_or("");
        for item in line.split(',').map(str::trim).filter(|i| !i.is_empty()) {
            if let Some((a, b)) = item.split_once('-') {
                let start = parse_port_str(a.trim())
                    .with_context(|| format!("invalid start in range: {item}"))?;
                let end = parse_port_str(b.trim())
                    .with_context(|| format!("invalid end in range: {item}"))?;
                if start > end {
                    bail!("invalid range {start}-{end} (start > end)");
                }
                for p in start..=end {
                    if seen.insert(p) {
                        out.push(p);
                    }
                }
            } else {
                let p = parse_port_str(item)
                    .with_context(|| format!("invalid port value: {item}"))?;
                if seen.insert(p) {
                    out.push(p);
                }
            }
        }
    }

    Ok(out)
}

/// Load a ports list from a file path. Errors if the file cannot be read or
/// parsed.
pub fn load_ports_from_path(path: impl AsRef<Path>) -> Result<Vec<u16>> {
    let content = fs::read_to_string(path.as_ref())
        .with_context(|| format!("failed to read ports file: {}", path.as_ref().display()))?;
    parse_ports_str(&content)
}

/// Resolve a CLI ports argument: a path to a ports file if one exists at
/// that location, otherwise an inline list like `22,80,8000-8010`.
/// `None` means the threat catalog's default ports.
pub fn resolve_ports_arg(arg: Option<&str>) -> Result<Vec<u16>> {
    let Some(arg) = arg else {
        return Ok(catalog::default_ports());
    };
    let ports = if Path::new(arg).exists() {
        load_ports_from_path(arg)?
    } else {
        parse_ports_str(arg)?
    };
    if ports.is_empty() {
        bail!("port specification produced no ports: {arg}");
    }
    Ok(ports)
}

fn parse_port_str(s: &str) -> Result<u16> {
    let val: u32 = s.parse::<u32>().map_err(|e| anyhow::anyhow!(e))?;
    if val == 0 || val > 65535 {
        bail!("port out of range: {val}");
    }
    Ok(val as u16)
}
