//! Threat classification: combine a port's catalog entry with banner-content
//! heuristics into a final threat string.

use crate::catalog;

/// Classify one open port. Banner rules are checked in order and only the
/// first match applies:
/// 1. `unauthorized` / `login` -> weak-authentication suffix
/// 2. `apache` / `nginx` -> web-stack suffix
pub fn classify(port: u16, banner: Option<&str>) -> String {
    let (_, base) = catalog::lookup(port);
    let Some(base) = base else {
        return format!("Open port {port}, unknown service");
    };

    if let Some(banner) = banner {
        let lower = banner.to_lowercase();
        if lower.contains("unauthorized") || lower.contains("login") {
            return format!("{base} + Possible weak authentication");
        }
        if lower.contains("apache") || lower.contains("nginx") {
            return format!("{base} + Public web stack exposed");
        }
    }
    base.to_string()
}
