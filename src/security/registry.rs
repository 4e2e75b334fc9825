//! Registry validation with SSRF protection.
//!
//! A registry is either a bare name from `.cargo/config.toml` or an index URL.
//! URLs must use a secure transport and must not resolve into private,
//! link-local or cloud-metadata address space. Loopback hosts are exempt so
//! local test registries keep working.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;
use url::{Host, Url};

use crate::core::HostResolver;

/// Schemes accepted for non-loopback registry URLs.
pub const SECURE_SCHEMES: &[&str] = &["https", "sparse+https"];

static REGISTRY_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9.-]*$").expect("registry name pattern"));

/// Reasons a registry value is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Bare registry name with characters outside the allowed set.
    #[error("invalid registry name format")]
    InvalidName,

    /// The value looked like a URL but did not parse.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// The URL has no host component.
    #[error("URL has no host")]
    MissingHost,

    /// Plain-text or otherwise unsupported scheme on a non-loopback host.
    #[error("only HTTPS URLs are allowed (got {0})")]
    InsecureScheme(String),

    /// The host resolves into blocked address space.
    #[error("URLs pointing to private networks are not allowed ({0})")]
    PrivateNetwork(IpAddr),
}

/// An IP block in CIDR form.
struct Cidr {
    addr: IpAddr,
    prefix: u8,
}

impl Cidr {
    const fn v4(a: u8, b: u8, c: u8, d: u8, prefix: u8) -> Self {
        Self { addr: IpAddr::V4(Ipv4Addr::new(a, b, c, d)), prefix }
    }

    const fn v6(segments: [u16; 8], prefix: u8) -> Self {
        let [a, b, c, d, e, f, g, h] = segments;
        Self { addr: IpAddr::V6(Ipv6Addr::new(a, b, c, d, e, f, g, h)), prefix }
    }

    fn contains(&self, ip: IpAddr) -> bool {
        match (self.addr, ip) {
            (IpAddr::V4(net), IpAddr::V4(ip)) => {
                let mask = u32::MAX.checked_shl(32 - u32::from(self.prefix)).unwrap_or(0);
                u32::from(net) & mask == u32::from(ip) & mask
            }
            (IpAddr::V6(net), IpAddr::V6(ip)) => {
                let mask = u128::MAX.checked_shl(128 - u32::from(self.prefix)).unwrap_or(0);
                u128::from(net) & mask == u128::from(ip) & mask
            }
            _ => false,
        }
    }
}

/// Private, reserved, link-local and cloud-metadata blocks.
const BLOCKED: &[Cidr] = &[
    Cidr::v4(10, 0, 0, 0, 8),
    Cidr::v4(172, 16, 0, 0, 12),
    Cidr::v4(192, 168, 0, 0, 16),
    Cidr::v4(127, 0, 0, 0, 8),
    Cidr::v4(169, 254, 0, 0, 16),
    Cidr::v4(0, 0, 0, 0, 8),
    Cidr::v4(224, 0, 0, 0, 24),
    // AWS/GCP/Azure instance metadata
    Cidr::v4(169, 254, 169, 254, 32),
    // AWS IMDS over IPv6
    Cidr::v6([0xfd00, 0xec2, 0, 0, 0, 0, 0, 0x254], 128),
    Cidr::v6([0, 0, 0, 0, 0, 0, 0, 0], 128),
    Cidr::v6([0, 0, 0, 0, 0, 0, 0, 1], 128),
    Cidr::v6([0xfc00, 0, 0, 0, 0, 0, 0, 0], 7),
    Cidr::v6([0xfe80, 0, 0, 0, 0, 0, 0, 0], 10),
    Cidr::v6([0xff02, 0, 0, 0, 0, 0, 0, 0], 16),
];

/// Check whether an address falls in private, reserved, link-local or
/// metadata space. IPv4-mapped IPv6 addresses are checked as IPv4.
pub fn is_private_ip(ip: IpAddr) -> bool {
    let ip = match ip {
        IpAddr::V6(v6) => v6.to_ipv4_mapped().map_or(ip, IpAddr::V4),
        v4 @ IpAddr::V4(_) => v4,
    };
    BLOCKED.iter().any(|block| block.contains(ip))
}

/// Host of a registry URL.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RegistryHost {
    Name(String),
    Ip(IpAddr),
}

impl RegistryHost {
    fn from_url(url: &Url) -> Option<Self> {
        let host = match url.host()? {
            // Non-special schemes such as `sparse+https` keep the host opaque.
            Host::Domain(domain) => {
                let bare = domain.trim_start_matches('[').trim_end_matches(']');
                match bare.parse::<IpAddr>() {
                    Ok(ip) => Self::Ip(ip),
                    Err(_) => Self::Name(bare.to_ascii_lowercase()),
                }
            }
            Host::Ipv4(v4) => Self::Ip(IpAddr::V4(v4)),
            Host::Ipv6(v6) => Self::Ip(IpAddr::V6(v6)),
        };
        if matches!(&host, Self::Name(name) if name.is_empty()) {
            return None;
        }
        Some(host)
    }

    fn is_loopback(&self) -> bool {
        match self {
            Self::Name(name) => name == "localhost",
            Self::Ip(ip) => {
                *ip == IpAddr::V4(Ipv4Addr::LOCALHOST) || *ip == IpAddr::V6(Ipv6Addr::LOCALHOST)
            }
        }
    }
}

/// Validate a bare registry name.
pub fn validate_registry_name(name: &str) -> Result<(), RegistryError> {
    if REGISTRY_NAME.is_match(name) {
        Ok(())
    } else {
        Err(RegistryError::InvalidName)
    }
}

fn parse_url(raw: &str) -> Result<Url, RegistryError> {
    Url::parse(raw).map_err(|e| RegistryError::InvalidUrl(e.to_string()))
}

/// URL cargo actually connects to.
///
/// `sparse+<scheme>` URLs are fetched over `<scheme>`, so the host is taken
/// from the URL with the prefix removed. That parse decodes the host the
/// same way the transport does.
fn transport_url(raw: &str, url: &Url) -> Result<Url, RegistryError> {
    if !url.scheme().starts_with("sparse+") {
        return Ok(url.clone());
    }
    match raw.trim_start().split_once('+') {
        Some((_, inner)) => parse_url(inner),
        None => Ok(url.clone()),
    }
}

/// Validate a registry name or URL.
///
/// DNS failures are not fatal: the validating environment may have no
/// resolver, so an unresolvable host is accepted.
pub async fn validate_registry(
    registry: &str,
    resolver: &dyn HostResolver,
) -> Result<(), RegistryError> {
    if !registry.contains("://") {
        return validate_registry_name(registry);
    }

    let url = parse_url(registry)?;
    let host = RegistryHost::from_url(&transport_url(registry, &url)?)
        .ok_or(RegistryError::MissingHost)?;

    if host.is_loopback() {
        return Ok(());
    }

    if !SECURE_SCHEMES.contains(&url.scheme()) {
        return Err(RegistryError::InsecureScheme(url.scheme().to_string()));
    }

    let ips = match host {
        RegistryHost::Ip(ip) => vec![ip],
        RegistryHost::Name(name) => match resolver.lookup(&name).await {
            Ok(ips) => ips,
            Err(e) => {
                tracing::warn!(host = %name, error = %e, "Registry host did not resolve; allowing");
                return Ok(());
            }
        },
    };

    match ips.into_iter().find(|ip| is_private_ip(*ip)) {
        Some(ip) => Err(RegistryError::PrivateNetwork(ip)),
        None => Ok(()),
    }
}
