//! Port probing
//!
//! This module performs a single timed connection attempt against one
//! address:port pair. For TLS ports the probe completes a handshake with peer
//! verification disabled (probing only, never a trust decision) and harvests
//! the DNS Subject Alternative Names from the leaf certificate.
//!
//! Connection failures, handshake failures, and timeouts are the expected
//! steady state of a scan and surface as `reachable = false`, never as
//! errors.

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::pin::Pin;
use std::time::Duration;

use log::debug;
use openssl::ssl::{SslConnector, SslMethod, SslVerifyMode};
use openssl::x509::X509;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_openssl::SslStream;

use crate::common::{MonitorError, Result};
use crate::config::Protocol;

/// Result of one probe
#[derive(Debug, Clone, Default)]
pub struct ProbeOutcome {
    /// Whether the address answered on the port
    pub reachable: bool,
    /// DNS Subject Alternative Names presented by the peer (TLS only)
    pub san_names: Vec<String>,
}

impl ProbeOutcome {
    fn unreachable() -> Self {
        Self::default()
    }
}

/// Probe one address:port pair.
///
/// # Parameters
///
/// * `address` - Address to probe
/// * `port` - Port to probe
/// * `protocol` - `https` performs a TLS handshake and harvests SANs
/// * `timeout` - Budget for the whole attempt (connect, handshake, request)
///
/// # Returns
///
/// The probe outcome. A probe that exceeds its timeout is treated
/// identically to a connection refusal.
pub async fn probe_port(
    address: Ipv4Addr,
    port: u16,
    protocol: Protocol,
    timeout: Duration,
) -> ProbeOutcome {
    debug!("checking {}://{}:{}", protocol, address, port);
    match tokio::time::timeout(timeout, attempt(address, port, protocol)).await {
        Ok(Ok(outcome)) => outcome,
        Ok(Err(e)) => {
            debug!("probe {}:{} failed: {}", address, port, e);
            ProbeOutcome::unreachable()
        }
        Err(_) => {
            debug!("probe {}:{} timed out", address, port);
            ProbeOutcome::unreachable()
        }
    }
}

async fn attempt(address: Ipv4Addr, port: u16, protocol: Protocol) -> Result<ProbeOutcome> {
    let peer = SocketAddr::new(IpAddr::V4(address), port);
    let tcp = TcpStream::connect(peer).await?;

    if protocol.is_tls() {
        probe_tls(tcp, address, port).await
    } else {
        probe_plain(tcp, address, port).await
    }
}

async fn probe_tls(tcp: TcpStream, address: Ipv4Addr, port: u16) -> Result<ProbeOutcome> {
    let mut builder = SslConnector::builder(SslMethod::tls())?;
    // Probing only: the certificate is a discovery signal, not a trust root.
    builder.set_verify(SslVerifyMode::NONE);
    let connector = builder.build();

    let mut configuration = connector.configure()?;
    configuration.set_verify_hostname(false);
    let ssl = configuration.into_ssl(&address.to_string())?;

    let mut stream = SslStream::new(ssl, tcp)?;
    Pin::new(&mut stream)
        .connect()
        .await
        .map_err(|e| MonitorError::TlsHandshake(e.to_string()))?;

    let san_names = stream
        .ssl()
        .peer_certificate()
        .map(|cert| dns_san_names(&cert))
        .unwrap_or_default();

    // A completed handshake already proves liveness; the minimal request is
    // best-effort and its outcome is ignored.
    let _ = stream.write_all(minimal_request(address, port).as_bytes()).await;
    let mut response = [0u8; 512];
    let _ = stream.read(&mut response).await;

    Ok(ProbeOutcome { reachable: true, san_names })
}

async fn probe_plain(mut tcp: TcpStream, address: Ipv4Addr, port: u16) -> Result<ProbeOutcome> {
    tcp.write_all(minimal_request(address, port).as_bytes()).await?;

    // Anything the peer sends back counts; an immediate EOF does not.
    let mut response = [0u8; 512];
    let read = tcp.read(&mut response).await?;
    Ok(ProbeOutcome {
        reachable: read > 0,
        san_names: Vec::new(),
    })
}

fn minimal_request(address: Ipv4Addr, port: u16) -> String {
    format!(
        "GET / HTTP/1.0\r\nHost: {}:{}\r\nConnection: close\r\n\r\n",
        address, port
    )
}

fn dns_san_names(cert: &X509) -> Vec<String> {
    let Some(entries) = cert.subject_alt_names() else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|name| name.dnsname().map(str::to_string))
        .collect()
}

/// Derive a base domain from harvested SAN names.
///
/// A SAN starting with the port's raw match prefix yields the remainder after
/// the prefix, with one leading `.` stripped so the result composes with rule
/// generation (`api.example.com` with prefix `api` yields `example.com`).
/// First matching SAN wins.
pub fn base_domain_from_sans(san_names: &[String], prefix: &str) -> Option<String> {
    if prefix.is_empty() {
        return None;
    }
    for san in san_names {
        if let Some(remainder) = san.strip_prefix(prefix) {
            let remainder = remainder.strip_prefix('.').unwrap_or(remainder);
            if !remainder.is_empty() {
                return Some(remainder.to_string());
            }
        }
    }
    None
}
