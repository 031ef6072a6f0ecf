use std::net::{IpAddr, SocketAddrV4};
use std::str::FromStr;
use std::time::Duration;

use tracing::instrument;

use crate::adapters::resolver;
use crate::domain::ntp::{ProbeResult, Target};
use crate::error::NtpError;
use crate::services::session::{DEFAULT_PORT, NtpClient};

/// Parsed view of a target string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedTarget<'a> {
    pub host: &'a str,
    pub port: Option<u16>,
}

/// Strict port parsing with range check (1..=65535).
fn parse_port_strict(s: &str) -> Result<u16, NtpError> {
    let raw =
        u32::from_str(s).map_err(|_| NtpError::InvalidTarget(format!("invalid port: '{s}'")))?;
    if raw == 0 || raw > u16::MAX as u32 {
        return Err(NtpError::InvalidTarget(format!(
            "port out of range [1..65535]: {raw}"
        )));
    }
    Ok(raw as u16)
}

/// Parse a user target string.
///
/// Supported forms:
/// - "hostname"
/// - "hostname:123"
/// - "1.2.3.4"
/// - "1.2.3.4:123"
///
/// IPv6 literals, bracketed or bare, are rejected.
pub fn parse_target(input: &str) -> Result<ParsedTarget<'_>, NtpError> {
    let s = input.trim();
    if s.is_empty() {
        return Err(NtpError::InvalidTarget("empty target".into()));
    }
    if s.starts_with('[') {
        return Err(NtpError::InvalidTarget(format!(
            "IPv6 targets are not supported: '{s}'"
        )));
    }

    match s.rsplit_once(':') {
        None => Ok(ParsedTarget {
            host: s,
            port: None,
        }),
        Some((host, _)) if host.contains(':') => Err(NtpError::InvalidTarget(format!(
            "IPv6 targets are not supported: '{s}'"
        ))),
        Some(("", _)) => Err(NtpError::InvalidTarget(format!(
            "missing host before port in '{s}'"
        ))),
        Some((host, port)) => Ok(ParsedTarget {
            host,
            port: Some(parse_port_strict(port)?),
        }),
    }
}

/// Query a single target and return a [`ProbeResult`].
///
/// The exchange itself is blocking; it runs on tokio's blocking pool so
/// several targets can be probed concurrently.
///
/// # Arguments
///
/// * `target` - Host name or IPv4 address, optionally with `:port`
/// * `version` - NTP version to put in the request (2, 3 or 4)
/// * `timeout` - Bound on both the send and the receive
#[instrument(skip(timeout))]
pub async fn query_one(
    target: &str,
    version: u8,
    timeout: Duration,
) -> Result<ProbeResult, NtpError> {
    let parsed = parse_target(target)?;
    let host = parsed.host.to_string();
    let port = parsed.port.unwrap_or(DEFAULT_PORT);

    let task = tokio::task::spawn_blocking(move || {
        let ip = resolver::resolve_ip(&host)?;
        let exchange =
            NtpClient::new().request_peer(&host, SocketAddrV4::new(ip, port), version, timeout)?;
        Ok::<_, NtpError>((ip, exchange))
    });
    let (ip, exchange) = task.await.map_err(|e| NtpError::Task(e.to_string()))??;

    ProbeResult::from_exchange(
        Target {
            name: target.to_string(),
            ip: IpAddr::V4(ip),
            port,
        },
        &exchange,
    )
}
