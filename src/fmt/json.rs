#[cfg(feature = "json")]
use chrono::Utc;
#[cfg(feature = "json")]
use serde::Serialize;

use crate::domain::ntp::ProbeResult;
use crate::error::NtpError;
use crate::stats::Stats;

#[cfg(feature = "json")]
#[derive(Serialize)]
pub struct JsonProbe {
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub offset_ms: f64,
    pub rtt_ms: f64,
    pub stratum: u8,
    pub ref_id: String,
    pub utc: String,
    pub local: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<JsonDetails>,
}

#[cfg(feature = "json")]
#[derive(Serialize)]
pub struct JsonDetails {
    pub version: u8,
    pub mode: String,
    pub leap: String,
    pub poll: i8,
    pub precision: i8,
    pub root_delay_ms: f64,
    pub root_dispersion_ms: f64,
}

#[cfg(feature = "json")]
#[derive(Serialize)]
pub struct JsonRun {
    pub schema_version: u8,
    pub run_ts: String,
    pub results: Vec<JsonProbe>,
}

#[cfg(feature = "json")]
#[derive(Serialize)]
struct JsonStats<'a> {
    name: &'a str,
    #[serde(flatten)]
    stats: &'a Stats,
}

#[cfg(feature = "json")]
fn serialize<T: Serialize>(value: &T, pretty: bool) -> Result<String, NtpError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    };
    text.map_err(|e| NtpError::Other(format!("json serialization: {e}")))
}

/// Serialize probe results into a JSON string.
#[allow(unused_variables)]
pub fn to_json(results: &[ProbeResult], pretty: bool, verbose: bool) -> Result<String, NtpError> {
    #[cfg(feature = "json")]
    {
        let probes = results
            .iter()
            .map(|r| JsonProbe {
                name: r.target.name.clone(),
                ip: r.target.ip.to_string(),
                port: r.target.port,
                offset_ms: r.offset_ms,
                rtt_ms: r.rtt_ms,
                stratum: r.stratum,
                ref_id: r.ref_id.clone(),
                utc: r.utc.to_rfc3339(),
                local: r.local.format("%Y-%m-%d %H:%M:%S%.3f").to_string(),
                details: verbose.then(|| JsonDetails {
                    version: r.version,
                    mode: r.mode.clone(),
                    leap: r.leap.clone(),
                    poll: r.poll,
                    precision: r.precision,
                    root_delay_ms: r.root_delay_ms,
                    root_dispersion_ms: r.root_dispersion_ms,
                }),
            })
            .collect();
        let run = JsonRun {
            schema_version: 1,
            run_ts: Utc::now().to_rfc3339(),
            results: probes,
        };
        serialize(&run, pretty)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(NtpError::Other("json feature disabled".into()))
    }
}

/// Serialize the summary of repeated probes.
#[allow(unused_variables)]
pub fn stats_to_json(name: &str, stats: &Stats, pretty: bool) -> Result<String, NtpError> {
    #[cfg(feature = "json")]
    {
        serialize(&JsonStats { name, stats }, pretty)
    }
    #[cfg(not(feature = "json"))]
    {
        Err(NtpError::Other("json feature disabled".into()))
    }
}
