use std::net::SocketAddr;
use std::time::Duration;

use hyper::Uri;

use crate::error::ConfigError;

pub const ORIGIN_URL: &str = "ORIGIN_URL";
pub const PROBE_BIND: &str = "PROBE_BIND";
pub const PROBE_REQUEST_TIMEOUT_MS: &str = "PROBE_REQUEST_TIMEOUT_MS";
pub const PROBE_LOG_FORMAT: &str = "PROBE_LOG_FORMAT";

const DEFAULT_BIND: &str = "127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Process-wide settings, resolved once at startup and read-only afterwards.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// The only origin a probe run will ever target.
    pub origin: Uri,
    /// `None` leaves outbound requests unbounded.
    pub request_timeout: Option<Duration>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let origin = lookup(ORIGIN_URL)
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing(ORIGIN_URL))?;
        let origin = parse_origin(origin.trim())?;

        let bind_raw = lookup(PROBE_BIND).unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind_raw
            .trim()
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                key: PROBE_BIND,
                reason: e.to_string(),
            })?;

        let timeout_ms = match lookup(PROBE_REQUEST_TIMEOUT_MS) {
            Some(raw) => raw
                .trim()
                .parse::<u64>()
                .map_err(|e| ConfigError::Invalid {
                    key: PROBE_REQUEST_TIMEOUT_MS,
                    reason: e.to_string(),
                })?,
            None => DEFAULT_REQUEST_TIMEOUT_MS,
        };
        let request_timeout = (timeout_ms > 0).then(|| Duration::from_millis(timeout_ms));

        let log_format = match lookup(PROBE_LOG_FORMAT).as_deref().map(str::trim) {
            None | Some("") | Some("text") => LogFormat::Text,
            Some("json") => LogFormat::Json,
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: PROBE_LOG_FORMAT,
                    reason: format!("expected `text` or `json`, got `{other}`"),
                })
            }
        };

        Ok(Self {
            bind_addr,
            origin,
            request_timeout,
            log_format,
        })
    }
}

fn parse_origin(raw: &str) -> Result<Uri, ConfigError> {
    let invalid = |reason: String| ConfigError::Invalid {
        key: ORIGIN_URL,
        reason,
    };
    let uri = raw.parse::<Uri>().map_err(|e| invalid(e.to_string()))?;
    if uri.authority().is_none() {
        return Err(invalid(format!("`{raw}` is not an absolute URI")));
    }
    // The client stack has no TLS connector
    match uri.scheme_str() {
        Some("http") => Ok(uri),
        other => Err(invalid(format!(
            "unsupported scheme {}",
            other.unwrap_or("<none>")
        ))),
    }
}
