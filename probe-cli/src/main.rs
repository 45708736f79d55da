use anyhow::Context;
use clap::Parser;
use probe_util::client::HttpClient;
use probe_util::ProbeQuery;
use tracing_subscriber::EnvFilter;

use crate::trigger::trigger;

mod trigger;

/// Triggers one load probe run and prints its report.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Base URI of the probe server
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server: String,

    /// Run duration in milliseconds, the server caps it at 10000
    #[arg(long)]
    dur: Option<String>,

    /// Requests per one-second window, the server caps it at 50
    #[arg(long)]
    rps: Option<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _guard = rt.enter();
    let query = ProbeQuery::new(args.dur, args.rps);
    let report = rt.block_on(trigger(&HttpClient::new(), &args.server, &query))?;
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("Failed to render report")?
    );
    Ok(())
}
