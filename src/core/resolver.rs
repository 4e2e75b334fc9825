//! Hostname resolution.
//!
//! Registry validation resolves hosts through [`HostResolver`] so tests can
//! answer lookups without touching the network.

use std::collections::HashMap;
use std::io;
use std::net::IpAddr;

use async_trait::async_trait;

/// Resolves a hostname to the addresses it currently points at.
#[async_trait]
pub trait HostResolver: Send + Sync {
    /// Look up every address for `host`.
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the system resolver (`getaddrinfo`).
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemResolver;

impl SystemResolver {
    /// Create a new system resolver.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl HostResolver for SystemResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        let addrs = tokio::net::lookup_host((host, 0)).await?;
        let mut ips: Vec<IpAddr> = addrs.map(|addr| addr.ip()).collect();
        ips.sort();
        ips.dedup();
        Ok(ips)
    }
}

/// Resolver with fixed answers.
///
/// Hosts that were never registered fail to resolve.
#[derive(Debug, Default, Clone)]
pub struct StaticResolver {
    hosts: HashMap<String, Vec<IpAddr>>,
}

impl StaticResolver {
    /// Create an empty resolver.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the addresses for a host.
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>, ips: impl IntoIterator<Item = IpAddr>) -> Self {
        self.hosts.insert(host.into().to_lowercase(), ips.into_iter().collect());
        self
    }
}

#[async_trait]
impl HostResolver for StaticResolver {
    async fn lookup(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        self.hosts.get(&host.to_lowercase()).cloned().ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("no such host: {}", host))
        })
    }
}
