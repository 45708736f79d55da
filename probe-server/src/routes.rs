use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use hyper::Uri;
use probe_util::{ProbeQuery, ProbeReport};

use crate::configurator::RunConfig;
use crate::dispatcher::{Dispatch, WindowedDispatcher};

pub struct ProbeState<D> {
    target: Uri,
    dispatcher: Arc<WindowedDispatcher<D>>,
}

impl<D> Clone for ProbeState<D> {
    fn clone(&self) -> Self {
        Self {
            target: self.target.clone(),
            dispatcher: Arc::clone(&self.dispatcher),
        }
    }
}

impl<D> ProbeState<D> {
    #[must_use]
    pub fn new(target: Uri, dispatcher: WindowedDispatcher<D>) -> Self {
        Self {
            target,
            dispatcher: Arc::new(dispatcher),
        }
    }
}

pub fn router<D>(state: ProbeState<D>) -> Router
where
    D: Dispatch,
{
    Router::new()
        .route("/", get(run_probe::<D>))
        .route("/probe", get(run_probe::<D>))
        .route("/healthz", get(healthz))
        .with_state(state)
}

async fn run_probe<D>(
    State(state): State<ProbeState<D>>,
    Query(query): Query<ProbeQuery>,
) -> Json<ProbeReport>
where
    D: Dispatch,
{
    let config = RunConfig::from_query(&query, &state.target);
    let result = state.dispatcher.run(&config).await;
    Json(ProbeReport::new(result.sent, result.duration_ms))
}

#[inline]
async fn healthz() -> &'static str {
    "ok"
}
