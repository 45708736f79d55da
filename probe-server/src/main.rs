use anyhow::Context;
use probe_server::config::ServerConfig;
use probe_server::dispatcher::{HyperDispatch, WindowedDispatcher};
use probe_server::routes::{router, ProbeState};
use tracing::info;

fn main() -> anyhow::Result<()> {
    let config = ServerConfig::from_env().context("Failed to load configuration")?;
    probe_server::telemetry::init(config.log_format);
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _g = rt.enter();
    rt.block_on(run_server(config))
}

async fn run_server(config: ServerConfig) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr))?;
    let dispatcher =
        WindowedDispatcher::new(HyperDispatch::default()).with_request_timeout(config.request_timeout);
    let router = router(ProbeState::new(config.origin.clone(), dispatcher));

    info!(
        bind_addr = %config.bind_addr,
        origin = %config.origin,
        request_timeout_ms = config.request_timeout.map(|t| t.as_millis() as u64),
        "Probe server listening"
    );
    axum::serve(listener, router).await.context("Server failed")
}
