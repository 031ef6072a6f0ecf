//! Offset and delay derived from one client/server round trip.

use chrono::{DateTime, Utc};

use super::packet::Packet;
use super::timestamp::to_calendar_time;

/// A decoded response together with the local receive time.
///
/// Offset and delay use the standard two-point estimators, which assume the
/// request and the response spend equal time on the network. An asymmetric
/// path shows up as offset error of half the asymmetry.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExchangeResult {
    packet: Packet,
    dest_timestamp: f64,
}

impl ExchangeResult {
    /// `dest_timestamp` is the NTP time at which the response was received.
    pub fn new(packet: Packet, dest_timestamp: f64) -> Self {
        ExchangeResult {
            packet,
            dest_timestamp,
        }
    }

    /// Estimated local clock offset, seconds. Positive means the server is ahead.
    pub fn offset(&self) -> f64 {
        let p = &self.packet;
        ((p.recv_timestamp - p.orig_timestamp) + (p.tx_timestamp - self.dest_timestamp)) / 2.0
    }

    /// Round-trip network delay, seconds, excluding server processing time.
    pub fn delay(&self) -> f64 {
        let p = &self.packet;
        (self.dest_timestamp - p.orig_timestamp) - (p.tx_timestamp - p.recv_timestamp)
    }

    pub fn packet(&self) -> &Packet {
        &self.packet
    }

    // NTP time.

    pub fn ref_timestamp(&self) -> f64 {
        self.packet.ref_timestamp
    }

    pub fn orig_timestamp(&self) -> f64 {
        self.packet.orig_timestamp
    }

    pub fn recv_timestamp(&self) -> f64 {
        self.packet.recv_timestamp
    }

    pub fn tx_timestamp(&self) -> f64 {
        self.packet.tx_timestamp
    }

    pub fn dest_timestamp(&self) -> f64 {
        self.dest_timestamp
    }

    // Calendar (Unix) time.

    pub fn ref_time(&self) -> f64 {
        to_calendar_time(self.packet.ref_timestamp)
    }

    pub fn orig_time(&self) -> f64 {
        to_calendar_time(self.packet.orig_timestamp)
    }

    pub fn recv_time(&self) -> f64 {
        to_calendar_time(self.packet.recv_timestamp)
    }

    pub fn tx_time(&self) -> f64 {
        to_calendar_time(self.packet.tx_timestamp)
    }

    pub fn dest_time(&self) -> f64 {
        to_calendar_time(self.dest_timestamp)
    }

    /// Server transmit time as a UTC date, if it lies in chrono's range.
    pub fn tx_datetime(&self) -> Option<DateTime<Utc>> {
        let t = self.tx_time();
        let secs = t.floor();
        let nanos = ((t - secs) * 1e9).round().min(999_999_999.0) as u32;
        DateTime::from_timestamp(secs as i64, nanos)
    }

    // Raw header fields.

    pub fn leap(&self) -> u8 {
        self.packet.leap
    }

    pub fn version(&self) -> u8 {
        self.packet.version
    }

    pub fn mode(&self) -> u8 {
        self.packet.mode
    }

    pub fn stratum(&self) -> u8 {
        self.packet.stratum
    }

    pub fn poll(&self) -> i8 {
        self.packet.poll
    }

    pub fn precision(&self) -> i8 {
        self.packet.precision
    }

    pub fn root_delay(&self) -> f64 {
        self.packet.root_delay
    }

    pub fn root_dispersion(&self) -> f64 {
        self.packet.root_dispersion
    }

    pub fn ref_id(&self) -> u32 {
        self.packet.ref_id
    }
}
