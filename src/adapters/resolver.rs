use std::io;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};

use crate::error::NtpError;

/// Host name to address lookup.
pub trait Resolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>>;
}

/// Resolver backed by the operating system (`getaddrinfo`).
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemResolver;

impl Resolver for SystemResolver {
    fn resolve(&self, host: &str) -> io::Result<Vec<IpAddr>> {
        Ok((host, 0).to_socket_addrs()?.map(|a| a.ip()).collect())
    }
}

/// Resolve `host` to its first IPv4 address.
pub fn resolve_ipv4<R: Resolver + ?Sized>(resolver: &R, host: &str) -> Result<Ipv4Addr, NtpError> {
    let addrs = resolver.resolve(host).map_err(|e| NtpError::Resolution {
        host: host.to_string(),
        reason: e.to_string(),
    })?;

    addrs
        .into_iter()
        .find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
        .ok_or_else(|| NtpError::Resolution {
            host: host.to_string(),
            reason: "no IPv4 address found".to_string(),
        })
}

/// Resolve `host` with the system resolver.
pub fn resolve_ip(host: &str) -> Result<Ipv4Addr, NtpError> {
    resolve_ipv4(&SystemResolver, host)
}
