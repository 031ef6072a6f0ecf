//! Human readable text for raw header fields.

use crate::error::{NtpError, Result};

static LEAP_TABLE: [&str; 4] = [
    "no warning",
    "last minute of the day has 61 seconds",
    "last minute of the day has 59 seconds",
    "unknown (clock unsynchronized)",
];

static MODE_TABLE: [&str; 8] = [
    "reserved",
    "symmetric active",
    "symmetric passive",
    "client",
    "server",
    "broadcast",
    "reserved for NTP control messages",
    "reserved for private use",
];

/// Reference clock codes used by stratum 0 and 1 servers.
static REF_ID_TABLE: &[(&[u8; 4], &str)] = &[
    (b"GOES", "Geosynchronous Orbit Environment Satellite"),
    (b"GPS\0", "Global Position System"),
    (b"GAL\0", "Galileo Positioning System"),
    (b"PPS\0", "Generic pulse-per-second"),
    (b"IRIG", "Inter-Range Instrumentation Group"),
    (b"WWVB", "LF Radio WWVB Ft. Collins, CO 60 kHz"),
    (b"DCF\0", "LF Radio DCF77 Mainflingen, DE 77.5 kHz"),
    (b"HBG\0", "LF Radio HBG Prangins, HB 75 kHz"),
    (b"MSF\0", "LF Radio MSF Anthorn, UK 60 kHz"),
    (b"JJY\0", "LF Radio JJY Fukushima, JP 40 kHz, Saga, JP 60 kHz"),
    (b"LORC", "MF Radio LORAN C station, 100 kHz"),
    (b"TDF\0", "MF Radio Allouis, FR 162 kHz"),
    (b"CHU\0", "HF Radio CHU Ottawa, Ontario"),
    (b"WWV\0", "HF Radio WWV Ft. Collins, CO"),
    (b"WWVH", "HF Radio WWVH Kauai, HI"),
    (b"NIST", "NIST telephone modem"),
    (b"ACTS", "NIST telephone modem"),
    (b"USNO", "USNO telephone modem"),
    (b"PTB\0", "European telephone modem"),
    (b"GOOG", "Google public NTP (smeared)"),
    (b"LOCL", "uncalibrated local clock"),
    (b"CESM", "calibrated Cesium clock"),
    (b"RBDM", "calibrated Rubidium clock"),
    (b"OMEG", "OMEGA radionavigation system"),
    (b"DCN\0", "DCN routing protocol"),
    (b"TSP\0", "TSP time protocol"),
    (b"DTS\0", "Digital Time Service"),
    (b"ATOM", "Atomic clock (calibrated)"),
    (b"VLF\0", "VLF radio (OMEGA,, etc.)"),
    (b"1PPS", "External 1 PPS input"),
    (b"FREE", "(Internal clock)"),
    (b"INIT", "(Initialization)"),
    (b"\0\0\0\0", "NULL"),
];

/// Text for a leap indicator value.
pub fn leap_to_text(leap: u8) -> Result<&'static str> {
    LEAP_TABLE
        .get(leap as usize)
        .copied()
        .ok_or_else(|| NtpError::Lookup(format!("invalid leap indicator {leap}")))
}

/// Text for a mode value.
pub fn mode_to_text(mode: u8) -> Result<&'static str> {
    MODE_TABLE
        .get(mode as usize)
        .copied()
        .ok_or_else(|| NtpError::Lookup(format!("invalid mode {mode}")))
}

/// Text for a stratum value. 17..=255 are reserved and rejected.
pub fn stratum_to_text(stratum: u8) -> Result<String> {
    match stratum {
        0 => Ok("unspecified or invalid".to_string()),
        1 => Ok(format!("primary reference ({stratum})")),
        2..=15 => Ok(format!("secondary reference ({stratum})")),
        16 => Ok("unsynchronized".to_string()),
        _ => Err(NtpError::Lookup(format!(
            "invalid or reserved stratum {stratum}"
        ))),
    }
}

/// Text for a reference id.
///
/// Stratum 0 and 1 carry a four character ASCII code; stratum 2 to 254 carry
/// the IPv4 address of the upstream server.
pub fn ref_id_to_text(ref_id: u32, stratum: u8) -> Result<String> {
    let bytes = ref_id.to_be_bytes();
    match stratum {
        0 | 1 => Ok(REF_ID_TABLE
            .iter()
            .find(|(code, _)| **code == bytes)
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| {
                format!(
                    "Unidentified reference source '{}'",
                    String::from_utf8_lossy(&bytes)
                )
            })),
        2..=254 => Ok(format!(
            "{}.{}.{}.{}",
            bytes[0], bytes[1], bytes[2], bytes[3]
        )),
        _ => Err(NtpError::Lookup(format!(
            "invalid stratum {stratum} for reference id"
        ))),
    }
}
