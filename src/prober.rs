//! Single-port probe: a full TCP connect bounded by a connect timeout, then
//! a passive banner read bounded by a separate, shorter timeout.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::net::TcpStream;
use tokio::time;

use crate::types::{ProbeError, ProbeOutcome};

/// Fixed cap on how many banner bytes are read from the wire.
pub const BANNER_BUF_SIZE: usize = 1024;

/// Probe one port on an already-resolved address.
///
/// - Connect refused or timed out -> `open = false`, no error: an expected
///   "closed port" outcome that callers must not log as a failure.
/// - Open with nothing readable before `banner_timeout` -> `banner = None`;
///   many services accept connections but stay silent without input.
/// - Any other connect or read error -> `ProbeError::Unexpected`, contained
///   to this port.
///
/// The stream is dropped (closed) on every exit path.
pub async fn probe(
    addr: IpAddr,
    port: u16,
    connect_timeout: Duration,
    banner_timeout: Duration,
) -> ProbeOutcome {
    let sock = SocketAddr::new(addr, port);
    let mut stream = match time::timeout(connect_timeout, TcpStream::connect(sock)).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(e)) if is_closed_kind(&e) => return ProbeOutcome::closed(port),
        Ok(Err(e)) => {
            return ProbeOutcome::failed(port, false, ProbeError::Unexpected(e.to_string()))
        }
        // Connect deadline elapsed: filtered or dropping silently.
        Err(_) => return ProbeOutcome::closed(port),
    };

    match read_banner(&mut stream, banner_timeout).await {
        Ok(banner) => ProbeOutcome::open(port, banner),
        Err(e) => ProbeOutcome::failed(port, true, ProbeError::Unexpected(e.to_string())),
    }
}

/// Error kinds that mean "nothing is listening", as opposed to a genuine
/// local failure like resource exhaustion.
fn is_closed_kind(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::ConnectionRefused
            | io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::TimedOut
    )
}

/// Passive banner grab: read up to `BANNER_BUF_SIZE` bytes with a short
/// timeout and decode lossily, so a non-text banner still yields a string.
/// Timeout and empty read both yield `None`.
async fn read_banner(
    stream: &mut TcpStream,
    banner_timeout: Duration,
) -> io::Result<Option<String>> {
    let mut buf = vec![0u8; BANNER_BUF_SIZE];
    match time::timeout(banner_timeout, stream.read(&mut buf)).await {
        Ok(Ok(n)) if n > 0 => {
            buf.truncate(n);
            let s = String::from_utf8_lossy(&buf).to_string();
            if s.trim().is_empty() {
                Ok(None)
            } else {
                Ok(Some(s))
            }
        }
        Ok(Ok(_)) => Ok(None),
        Ok(Err(e)) => Err(e),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;
    use tokio::io::AsyncWriteExt;
    use tokio::net::TcpListener;

    const LOCALHOST: IpAddr = IpAddr::V4(Ipv4Addr::LOCALHOST);
    const CONNECT: Duration = Duration::from_millis(500);
    const BANNER: Duration = Duration::from_millis(200);

    #[tokio::test]
    async fn open_port_with_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let _ = sock.write_all(b"SSH-2.0-OpenSSH\r\n").await;
            // Hold the socket open past the probe's read.
            time::sleep(Duration::from_millis(400)).await;
        });

        let outcome = probe(LOCALHOST, port, CONNECT, BANNER).await;
        assert!(outcome.open);
        assert!(outcome.error.is_none());
        assert_eq!(outcome.banner.as_deref(), Some("SSH-2.0-OpenSSH\r\n"));
    }

    #[tokio::test]
    async fn open_port_silent_service_has_no_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (_sock, _) = listener.accept().await.unwrap();
            // Say nothing until well past the banner timeout.
            time::sleep(Duration::from_millis(600)).await;
        });

        let outcome = probe(LOCALHOST, port, CONNECT, BANNER).await;
        assert!(outcome.open);
        assert_eq!(outcome.banner, None);
        assert!(outcome.error.is_none());
    }

    #[tokio::test]
    async fn closed_port_is_not_an_error() {
        // Bind then drop to find a port with nothing listening.
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let outcome = probe(LOCALHOST, port, CONNECT, BANNER).await;
        assert_eq!(outcome, ProbeOutcome::closed(port));
    }

    #[tokio::test]
    async fn immediate_eof_yields_no_banner() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            // Accept and hang up straight away: the probe sees EOF.
            let _ = listener.accept().await;
        });

        let outcome = probe(LOCALHOST, port, CONNECT, BANNER).await;
        assert!(outcome.open);
        assert_eq!(outcome.banner, None);
    }

    #[tokio::test]
    async fn non_utf8_banner_decodes_lossily() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        tokio::spawn(async move {
            let (mut sock, _) = listener.accept().await.unwrap();
            let _ = sock.write_all(b"\xff\xfeMySQL").await;
            time::sleep(Duration::from_millis(400)).await;
        });

        let outcome = probe(LOCALHOST, port, CONNECT, BANNER).await;
        assert!(outcome.open);
        let banner = outcome.banner.unwrap();
        assert!(banner.contains("MySQL"));
    }
}
