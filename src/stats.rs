use crate::domain::ntp::ProbeResult;
#[cfg(feature = "json")]
use serde::Serialize;

/// Summary over repeated probes of the same server.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "json", derive(Serialize))]
pub struct Stats {
    pub count: usize,
    pub offset_avg: f64,
    pub offset_min: f64,
    pub offset_max: f64,
    pub rtt_avg: f64,
    pub rtt_min: f64,
}

/// Compute summary statistics. Returns `None` for an empty slice.
pub fn compute_stats(results: &[ProbeResult]) -> Option<Stats> {
    if results.is_empty() {
        return None;
    }
    let count = results.len();
    let offset_avg = results.iter().map(|r| r.offset_ms).sum::<f64>() / count as f64;
    let offset_min = results
        .iter()
        .map(|r| r.offset_ms)
        .fold(f64::INFINITY, f64::min);
    let offset_max = results
        .iter()
        .map(|r| r.offset_ms)
        .fold(f64::NEG_INFINITY, f64::max);
    let rtt_avg = results.iter().map(|r| r.rtt_ms).sum::<f64>() / count as f64;
    let rtt_min = results.iter().map(|r| r.rtt_ms).fold(f64::INFINITY, f64::min);
    Some(Stats {
        count,
        offset_avg,
        offset_min,
        offset_max,
        rtt_avg,
        rtt_min,
    })
}
