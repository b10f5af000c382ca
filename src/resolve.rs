//! Host resolution through the platform resolver. Done once per scan,
//! before any probe is issued.

use std::net::IpAddr;

use thiserror::Error;
use tokio::net::lookup_host;
use trust_dns_resolver::config::{ResolverConfig, ResolverOpts};
use trust_dns_resolver::TokioAsyncResolver;

#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("DNS lookup failed for {host}: {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },
    #[error("no addresses found for {0}")]
    NoAddresses(String),
}

/// Resolve a host name or IP literal to a single address, preferring IPv4
/// when the resolver returns both families.
pub async fn resolve_host(host: &str) -> Result<IpAddr, ResolveError> {
    // IP literals skip the resolver entirely.
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(ip);
    }

    let addrs: Vec<IpAddr> = lookup_host((host, 0u16))
        .await
        .map_err(|source| ResolveError::Lookup {
            host: host.to_string(),
            source,
        })?
        .map(|sa| sa.ip())
        .collect();

    addrs
        .iter()
        .find(|ip| ip.is_ipv4())
        .or_else(|| addrs.first())
        .copied()
        .ok_or_else(|| ResolveError::NoAddresses(host.to_string()))
}

/// Best-effort PTR lookup for an address, used to annotate reports. Any
/// failure (no PTR record, resolver unreachable) yields `None`.
pub async fn reverse_dns(ip: IpAddr) -> Option<String> {
    let resolver = TokioAsyncResolver::tokio(ResolverConfig::default(), ResolverOpts::default());
    let response = resolver.reverse_lookup(ip).await.ok()?;
    response
        .iter()
        .next()
        .map(|name| name.to_string().trim_end_matches('.').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn ip_literal_resolves_without_dns() {
        let ip = resolve_host("127.0.0.1").await.unwrap();
        assert_eq!(ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
    }

    #[tokio::test]
    async fn ipv6_literal_resolves() {
        let ip = resolve_host("::1").await.unwrap();
        assert!(ip.is_ipv6());
    }

    #[tokio::test]
    async fn invalid_host_fails() {
        // .invalid is reserved and guaranteed not to resolve (RFC 2606).
        let err = resolve_host("no-such-host.invalid").await;
        assert!(err.is_err());
    }

    #[tokio::test]
    async fn reverse_dns_is_best_effort() {
        // Loopback rarely has a public PTR record; whatever the local
        // resolver answers, the lookup must degrade to None, never fail.
        if let Some(name) = reverse_dns(IpAddr::V4(Ipv4Addr::LOCALHOST)).await {
            assert!(!name.is_empty());
            assert!(!name.ends_with('.'));
        }
    }
}
