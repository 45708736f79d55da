pub mod client;
pub mod drain;

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use bytes::Bytes;
use http_body_util::Full;

/// Fixed note attached to every probe report.
pub const PROBE_NOTE: &str = "own-origin load probe";

#[inline]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}

#[inline]
pub fn byte_body<B: Into<Bytes>>(bytes: B) -> Full<Bytes> {
    Full::new(bytes.into())
}

/// Raw trigger parameters. Both are kept as strings so that a malformed value
/// reaches the run configurator instead of failing extraction.
#[derive(Debug, Default, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProbeQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dur: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rps: Option<String>,
}

impl ProbeQuery {
    #[must_use]
    pub fn new(dur: Option<String>, rps: Option<String>) -> Self {
        Self { dur, rps }
    }

    /// Renders `dur`/`rps` as a query string, empty if neither is set.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        let pairs = [("dur", &self.dur), ("rps", &self.rps)];
        let joined = pairs
            .iter()
            .filter_map(|(k, v)| v.as_ref().map(|v| format!("{k}={v}")))
            .collect::<Vec<_>>()
            .join("&");
        if joined.is_empty() {
            joined
        } else {
            format!("?{joined}")
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ProbeReport {
    pub sent: u64,
    #[serde(rename = "durationMs")]
    pub duration_ms: u64,
    pub note: String,
}

impl ProbeReport {
    #[must_use]
    pub fn new(sent: u64, duration_ms: u64) -> Self {
        Self {
            sent,
            duration_ms,
            note: PROBE_NOTE.to_string(),
        }
    }
}

/// Hit count shared between the connections of the sink origin.
#[derive(Clone, Default)]
pub struct HitCounter {
    count: Arc<AtomicU64>,
}

impl HitCounter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn hit(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    #[inline]
    #[must_use]
    pub fn get(&self) -> HitsResponse {
        HitsResponse {
            hits: self.count.load(Ordering::Acquire),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct HitsResponse {
    pub hits: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_uses_camel_case_duration() {
        let raw = serde_json::to_string(&ProbeReport::new(15, 3000)).unwrap();
        assert_eq!(
            r#"{"sent":15,"durationMs":3000,"note":"own-origin load probe"}"#,
            raw
        );
    }

    #[test]
    fn query_string_skips_missing_params() {
        assert_eq!("", ProbeQuery::default().to_query_string());
        let q = ProbeQuery::new(Some("3000".to_string()), None);
        assert_eq!("?dur=3000", q.to_query_string());
        let q = ProbeQuery::new(Some("0".to_string()), Some("5".to_string()));
        assert_eq!("?dur=0&rps=5", q.to_query_string());
    }

    #[test]
    fn hit_counter_is_shared_between_clones() {
        let counter = HitCounter::new();
        let other = counter.clone();
        counter.hit();
        assert_eq!(2, other.hit());
        assert_eq!(HitsResponse { hits: 2 }, counter.get());
    }
}
