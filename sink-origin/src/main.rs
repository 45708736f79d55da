use anyhow::Context;
use bytes::Bytes;
use http_body_util::Full;
use hyper::body::Body;
use hyper::header::{CACHE_CONTROL, CONTENT_TYPE};
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use mimalloc::MiMalloc;
use probe_util::{byte_body, empty_body, HitCounter};
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

const PROBE_SINK_BIND: &str = "PROBE_SINK_BIND";
const DEFAULT_BIND: &str = "127.0.0.1:8081";
const PAYLOAD: &[u8] = &[0xA5; 1024];

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let addr: SocketAddr = std::env::var(PROBE_SINK_BIND)
        .unwrap_or_else(|_| DEFAULT_BIND.to_string())
        .parse()
        .with_context(|| format!("Invalid {PROBE_SINK_BIND}"))?;
    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to build runtime")?;
    let _guard = rt.enter();
    rt.block_on(run_app(addr))
}

async fn sink_service<B: Body>(
    hits: HitCounter,
    incoming: Request<B>,
) -> Result<Response<Full<Bytes>>, Infallible> {
    if incoming.method() != Method::GET {
        return Ok(status_only(StatusCode::METHOD_NOT_ALLOWED));
    }
    match incoming.uri().path() {
        "/hits" => match serde_json::to_vec(&hits.get()) {
            Ok(payload) => Ok(Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "application/json")
                .body(byte_body(payload))
                .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR))),
            Err(_) => Ok(status_only(StatusCode::INTERNAL_SERVER_ERROR)),
        },
        _ => {
            let count = hits.hit();
            debug!(count, uri = %incoming.uri(), "Sink hit");
            Ok(Response::builder()
                .status(StatusCode::OK)
                .header(CONTENT_TYPE, "application/octet-stream")
                .header(CACHE_CONTROL, "no-store")
                .body(byte_body(PAYLOAD))
                .unwrap_or_else(|_| status_only(StatusCode::INTERNAL_SERVER_ERROR)))
        }
    }
}

fn status_only(status: StatusCode) -> Response<Full<Bytes>> {
    let mut resp = Response::new(empty_body());
    *resp.status_mut() = status;
    resp
}

async fn run_app(addr: SocketAddr) -> anyhow::Result<()> {
    let sock = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!(%addr, "Sink origin listening");
    let hits = HitCounter::new();
    loop {
        let (tcp, peer) = match sock.accept().await {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "Failed to accept connection");
                continue;
            }
        };
        let tcp = TokioIo::new(tcp);
        let hc = hits.clone();
        tokio::task::spawn(async move {
            let conn = hyper::server::conn::http1::Builder::new()
                .serve_connection(tcp, service_fn(move |req| sink_service(hc.clone(), req)));
            if let Err(e) = conn.await {
                debug!(%peer, error = %e, "Connection closed with error");
            }
        });
    }
}
