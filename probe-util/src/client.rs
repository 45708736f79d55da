use anyhow::{Context, Result};
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, StatusCode};
use hyper_util::client::legacy::connect::HttpConnector;
use hyper_util::client::legacy::Client;
use hyper_util::rt::TokioExecutor;

use crate::drain::DrainBodyFuture;

#[derive(Clone)]
pub struct HttpClient {
    client: Client<HttpConnector, Full<Bytes>>,
}

impl HttpClient {
    #[must_use]
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self { client }
    }

    /// Sends the request and collects the whole response body.
    pub async fn send_recv(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, Bytes)> {
        let resp = self
            .client
            .request(request)
            .await
            .context("Failed to send request")?;
        let status = resp.status();
        let bytes = resp
            .into_body()
            .collect()
            .await
            .context("Failed to read response body")?
            .to_bytes();
        Ok((status, bytes))
    }

    /// Sends the request and drains the response body without keeping it,
    /// returns the status and the number of body bytes received.
    pub async fn send_discard(&self, request: Request<Full<Bytes>>) -> Result<(StatusCode, u64)> {
        let resp = self
            .client
            .request(request)
            .await
            .context("Failed to send request")?;
        let status = resp.status();
        let drained = DrainBodyFuture::new(resp.into_body()).await?;
        Ok((status, drained))
    }
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}
