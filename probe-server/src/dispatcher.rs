use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use hyper::Uri;
use probe_util::client::HttpClient;
use tokio::time::Instant;
use tracing::{debug, info, trace};

use crate::configurator::RunConfig;
use crate::descriptor::RequestDescriptor;
use crate::error::DispatchError;

pub const WINDOW: Duration = Duration::from_secs(1);

/// Sends a single probe request.
pub trait Dispatch: Send + Sync + 'static {
    fn dispatch(
        &self,
        request: RequestDescriptor,
    ) -> impl Future<Output = Result<(), DispatchError>> + Send;
}

/// Real transport, pooled connections to the target origin.
#[derive(Clone, Default)]
pub struct HyperDispatch {
    client: HttpClient,
}

impl HyperDispatch {
    #[must_use]
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }
}

impl Dispatch for HyperDispatch {
    async fn dispatch(&self, request: RequestDescriptor) -> Result<(), DispatchError> {
        let request = request.into_request()?;
        let (status, _drained) = self
            .client
            .send_discard(request)
            .await
            .map_err(DispatchError::Transport)?;
        if status.is_success() {
            Ok(())
        } else {
            Err(DispatchError::Status(status))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowResult {
    pub attempted: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Requests attempted, successful or not.
    pub sent: u64,
    pub duration_ms: u64,
    pub windows: u64,
}

/// Cuts a run into one-second windows. Each window fans out `rps` requests
/// and waits for all of them to settle, then sleeps a flat window length
/// regardless of how long the batch took.
pub struct WindowedDispatcher<D> {
    dispatch: D,
    window: Duration,
    request_timeout: Option<Duration>,
}

impl<D> WindowedDispatcher<D>
where
    D: Dispatch,
{
    #[must_use]
    pub fn new(dispatch: D) -> Self {
        Self {
            dispatch,
            window: WINDOW,
            request_timeout: None,
        }
    }

    /// Bounds every request so that a hung target cannot hold a window open.
    #[must_use]
    pub fn with_request_timeout(mut self, request_timeout: Option<Duration>) -> Self {
        self.request_timeout = request_timeout;
        self
    }

    /// Runs windows until the deadline passes. Never fails, the count
    /// reflects attempts only.
    pub async fn run(&self, config: &RunConfig) -> RunResult {
        let started = Instant::now();
        let deadline = started + Duration::from_millis(config.duration_ms);
        let mut sent = 0;
        let mut windows = 0;
        info!(
            target_uri = %config.target,
            duration_ms = config.duration_ms,
            rps = config.rps,
            "Probe run started"
        );
        while Instant::now() < deadline {
            let window = self.run_window(config).await;
            sent += window.attempted;
            windows += 1;
            debug!(window = windows, attempted = window.attempted, sent, "Window settled");
            tokio::time::sleep(self.window).await;
        }
        info!(
            sent,
            windows,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Probe run finished"
        );
        RunResult {
            sent,
            duration_ms: config.duration_ms,
            windows,
        }
    }

    /// Launches one batch and returns once every request in it has settled.
    pub async fn run_window(&self, config: &RunConfig) -> WindowResult {
        let batch: Vec<_> = (0..config.rps)
            .map(|_| RequestDescriptor::fresh(&config.target))
            .collect();
        let attempted = batch.len() as u64;
        let _outcomes: Vec<Result<(), DispatchError>> =
            join_all(batch.into_iter().map(|d| self.attempt(&config.target, d))).await;
        WindowResult { attempted }
    }

    async fn attempt(
        &self,
        target: &Uri,
        descriptor: Result<RequestDescriptor, hyper::http::Error>,
    ) -> Result<(), DispatchError> {
        let outcome = match descriptor {
            Ok(descriptor) => match self.request_timeout {
                Some(limit) => tokio::time::timeout(limit, self.dispatch.dispatch(descriptor))
                    .await
                    .unwrap_or(Err(DispatchError::Timeout(limit))),
                None => self.dispatch.dispatch(descriptor).await,
            },
            Err(e) => Err(DispatchError::Request(e)),
        };
        if let Err(e) = &outcome {
            trace!(target_uri = %target, error = %e, "Probe request failed");
        }
        outcome
    }
}
