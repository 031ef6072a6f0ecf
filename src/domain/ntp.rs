use chrono::{DateTime, Local, Utc};
use std::net::IpAddr;

#[cfg(feature = "json")]
use serde::Serialize;

use crate::error::NtpError;
use crate::ntp::ExchangeResult;
use crate::ntp::tables::{leap_to_text, mode_to_text, ref_id_to_text};

/// Target host resolved to an IP address.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "json", derive(Serialize))]
pub struct Target {
    pub name: String,
    pub ip: IpAddr,
    pub port: u16,
}

/// Result of probing an NTP server, ready for display.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "json", derive(Serialize))]
pub struct ProbeResult {
    pub target: Target,
    pub offset_ms: f64,
    pub rtt_ms: f64,
    pub version: u8,
    pub mode: String,
    pub leap: String,
    pub stratum: u8,
    pub ref_id: String,
    pub poll: i8,
    pub precision: i8,
    pub root_delay_ms: f64,
    pub root_dispersion_ms: f64,
    pub utc: DateTime<Utc>,
    pub local: DateTime<Local>,
}

impl ProbeResult {
    /// Build a probe from a completed exchange.
    pub fn from_exchange(target: Target, exchange: &ExchangeResult) -> Result<Self, NtpError> {
        let utc = exchange.tx_datetime().ok_or_else(|| {
            NtpError::Other(format!(
                "transmit timestamp {} is outside the displayable date range",
                exchange.tx_timestamp()
            ))
        })?;
        // Lookups only fail on reserved values; show those raw.
        let ref_id = ref_id_to_text(exchange.ref_id(), exchange.stratum())
            .unwrap_or_else(|_| format!("{:#010x}", exchange.ref_id()));
        let leap = leap_to_text(exchange.leap())
            .map(str::to_string)
            .unwrap_or_else(|_| exchange.leap().to_string());
        let mode = mode_to_text(exchange.mode())
            .map(str::to_string)
            .unwrap_or_else(|_| exchange.mode().to_string());

        Ok(ProbeResult {
            target,
            offset_ms: exchange.offset() * 1000.0,
            rtt_ms: exchange.delay() * 1000.0,
            version: exchange.version(),
            mode,
            leap,
            stratum: exchange.stratum(),
            ref_id,
            poll: exchange.poll(),
            precision: exchange.precision(),
            root_delay_ms: exchange.root_delay() * 1000.0,
            root_dispersion_ms: exchange.root_dispersion() * 1000.0,
            utc,
            local: DateTime::from(utc),
        })
    }
}
