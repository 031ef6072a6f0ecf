use futures::future::join_all;
use std::time::Duration;

use crate::domain::ntp::ProbeResult;
use crate::error::NtpError;
use tracing::instrument;

use super::query::query_one;

/// Query many targets concurrently and return all [`ProbeResult`]s.
///
/// Each target gets its own independent exchange. The first failure, in
/// target order, is returned.
#[instrument(skip(timeout))]
pub async fn compare_many(
    targets: &[String],
    version: u8,
    timeout: Duration,
) -> Result<Vec<ProbeResult>, NtpError> {
    let futures = targets
        .iter()
        .map(|t| query_one(t, version, timeout))
        .collect::<Vec<_>>();
    let results = join_all(futures).await;
    let mut out = Vec::new();
    for res in results {
        out.push(res?);
    }
    Ok(out)
}
