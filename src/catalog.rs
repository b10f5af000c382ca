//! Static threat catalog: well-known ports mapped to service names and
//! baseline threat descriptions. Read-only process-wide data.

/// One known-port entry. At most one entry per port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogEntry {
    pub port: u16,
    pub service: &'static str,
    pub base_threat: &'static str,
}

/// Sorted by port so `default_ports` comes out ascending.
const ENTRIES: &[CatalogEntry] = &[
    CatalogEntry { port: 21, service: "FTP", base_threat: "Unencrypted FTP Detected" },
    CatalogEntry { port: 22, service: "SSH", base_threat: "SSH Brute Force Risk" },
    CatalogEntry { port: 23, service: "Telnet", base_threat: "Legacy Telnet Exposure" },
    CatalogEntry { port: 25, service: "SMTP", base_threat: "SMTP Relay Open" },
    CatalogEntry { port: 53, service: "DNS", base_threat: "DNS Abuse Possibility" },
    CatalogEntry { port: 80, service: "HTTP", base_threat: "Public Web Server Found" },
    CatalogEntry { port: 110, service: "POP3", base_threat: "POP3 Credentials Leak" },
    CatalogEntry { port: 139, service: "NetBIOS", base_threat: "NetBIOS Enumeration Risk" },
    CatalogEntry { port: 143, service: "IMAP", base_threat: "Unsecured IMAP Detected" },
    CatalogEntry { port: 443, service: "HTTPS", base_threat: "HTTPS Server Exposed" },
    CatalogEntry { port: 445, service: "SMB", base_threat: "Potential EternalBlue SMB" },
    CatalogEntry { port: 3306, service: "MySQL", base_threat: "MySQL Open To Public" },
    CatalogEntry { port: 3389, service: "RDP", base_threat: "RDP Lateral Movement Vector" },
    CatalogEntry { port: 5900, service: "VNC", base_threat: "VNC Exposed Interface" },
    CatalogEntry { port: 8080, service: "HTTP-Alt", base_threat: "Unsecured Alt-Web Interface" },
];

/// Look up a port. Total function: unknown ports yield `("Unknown", None)`.
pub fn lookup(port: u16) -> (&'static str, Option<&'static str>) {
    match ENTRIES.binary_search_by_key(&port, |e| e.port) {
        Ok(i) => (ENTRIES[i].service, Some(ENTRIES[i].base_threat)),
        Err(_) => ("Unknown", None),
    }
}

/// Service name only, `"Unknown"` for uncataloged ports.
pub fn service_name(port: u16) -> &'static str {
    lookup(port).0
}

/// The catalog's ports in ascending order; the default scan port list.
pub fn default_ports() -> Vec<u16> {
    ENTRIES.iter().map(|e| e.port).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_sorted_and_unique() {
        for pair in ENTRIES.windows(2) {
            assert!(pair[0].port < pair[1].port);
        }
    }

    #[test]
    fn known_ports_resolve() {
        assert_eq!(lookup(22), ("SSH", Some("SSH Brute Force Risk")));
        assert_eq!(lookup(445), ("SMB", Some("Potential EternalBlue SMB")));
        assert_eq!(lookup(8080).0, "HTTP-Alt");
    }

    #[test]
    fn unknown_port_is_total() {
        assert_eq!(lookup(31337), ("Unknown", None));
        assert_eq!(service_name(0), "Unknown");
    }

    #[test]
    fn default_ports_ascending_and_complete() {
        let ports = default_ports();
        assert_eq!(ports.len(), 15);
        assert!(ports.windows(2).all(|w| w[0] < w[1]));
        assert!(ports.contains(&21) && ports.contains(&3389));
    }
}
