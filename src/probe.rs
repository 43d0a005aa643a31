//! Light network reconnaissance of the target host: one DNS resolution and a
//! sequential TCP connect check over a small fixed port list.

use hickory_resolver::TokioAsyncResolver;
use serde::Serialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::config::ProbeConfig;
use crate::domain_utils;

/// Outcome of resolving the target host.
///
/// A failed resolution is data, not an error: it is logged as a marker and
/// only causes the port scan to be skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Resolution {
    Resolved(IpAddr),
    Failed(String),
}

impl Resolution {
    pub fn address(&self) -> Option<IpAddr> {
        match self {
            Resolution::Resolved(addr) => Some(*addr),
            Resolution::Failed(_) => None,
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resolution::Resolved(addr) => write!(f, "{}", addr),
            Resolution::Failed(marker) => write!(f, "{}", marker),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub resolved: Resolution,
    /// `None` when the scan was skipped because resolution failed
    pub open_ports: Option<Vec<u16>>,
}

pub struct NetworkProbe {
    ports: Vec<u16>,
    connect_timeout: Duration,
}

impl NetworkProbe {
    pub fn from_config(config: &ProbeConfig) -> Self {
        Self::new(config.ports.clone(), config.connect_timeout())
    }

    pub fn new(ports: Vec<u16>, connect_timeout: Duration) -> Self {
        Self { ports, connect_timeout }
    }

    /// Resolve the target and, when that succeeds, scan its ports
    pub async fn probe(&self, url: &str) -> ProbeResult {
        let resolved = resolve_address(url).await;
        let open_ports = match resolved.address() {
            Some(addr) => Some(scan_ports(addr, &self.ports, self.connect_timeout).await),
            None => {
                debug!("Skipping port scan for {}: {}", url, resolved);
                None
            }
        };
        ProbeResult { resolved, open_ports }
    }
}

/// Resolve the host portion of `url` to a single address, preferring IPv4
pub async fn resolve_address(url: &str) -> Resolution {
    let host = domain_utils::resolvable_host(url);
    if host.is_empty() {
        return Resolution::Failed(format!("Could not resolve IP: no host in '{}'", url));
    }

    if let Ok(addr) = host.parse::<IpAddr>() {
        return Resolution::Resolved(addr);
    }

    match lookup_host(&host).await {
        Ok(addr) => {
            debug!("Resolved {} to {}", host, addr);
            Resolution::Resolved(addr)
        }
        Err(e) => {
            warn!("DNS resolution failed for {}: {}", host, e);
            Resolution::Failed(format!("Could not resolve IP: {}", e))
        }
    }
}

async fn lookup_host(host: &str) -> anyhow::Result<IpAddr> {
    let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
    let lookup = resolver.lookup_ip(host).await?;

    let addresses: Vec<IpAddr> = lookup.iter().collect();
    addresses
        .iter()
        .find(|addr| addr.is_ipv4())
        .or_else(|| addresses.first())
        .copied()
        .ok_or_else(|| anyhow::anyhow!("no addresses returned for {}", host))
}

/// Try each port in order; any failure counts as closed and never stops the scan
pub async fn scan_ports(addr: IpAddr, ports: &[u16], connect_timeout: Duration) -> Vec<u16> {
    let mut open = Vec::new();

    for &port in ports {
        let socket_addr = SocketAddr::new(addr, port);
        match timeout(connect_timeout, TcpStream::connect(socket_addr)).await {
            Ok(Ok(_stream)) => {
                debug!("Port {} open on {}", port, addr);
                open.push(port);
            }
            Ok(Err(e)) => debug!("Port {} closed on {}: {}", port, addr, e),
            Err(_elapsed) => debug!("Port {} timed out on {}", port, addr),
        }
    }

    open
}
