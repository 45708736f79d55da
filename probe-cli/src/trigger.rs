use std::future::Future;
use std::time::Duration;

use anyhow::{bail, Context};
use hyper::Request;
use probe_util::client::HttpClient;
use probe_util::{empty_body, ProbeQuery, ProbeReport};
use tokio::time::Instant;
use tracing::info;

/// Blocks until the server finishes the run and returns its report.
pub(crate) async fn trigger(
    client: &HttpClient,
    server: &str,
    query: &ProbeQuery,
) -> anyhow::Result<ProbeReport> {
    let uri = probe_uri(server, query);
    let req = Request::get(&uri)
        .body(empty_body())
        .with_context(|| format!("Failed to build request for {uri}"))?;
    let (wall, resp) = run_timed(client.send_recv(req)).await;
    let (status, body) = resp.context("Probe request failed")?;
    if !status.is_success() {
        bail!("Probe server answered {status}");
    }
    let report: ProbeReport =
        serde_json::from_slice(&body).context("Failed to deserialize probe report")?;
    info!(
        sent = report.sent,
        duration_ms = report.duration_ms,
        wall_ms = wall.as_millis() as u64,
        "Probe finished"
    );
    Ok(report)
}

fn probe_uri(server: &str, query: &ProbeQuery) -> String {
    format!("{}/{}", server.trim_end_matches('/'), query.to_query_string())
}

#[inline]
async fn run_timed<T, F: Future<Output = T>>(fut: F) -> (Duration, T) {
    let start = Instant::now();
    let res = fut.await;
    (start.elapsed(), res)
}
