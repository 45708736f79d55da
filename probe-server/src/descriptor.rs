use std::time::{SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use http_body_util::Full;
use hyper::header::{ACCEPT, CACHE_CONTROL};
use hyper::http::uri::PathAndQuery;
use hyper::{Request, Uri};
use probe_util::empty_body;
use rand::distributions::Alphanumeric;
use rand::Rng;

const TIMESTAMP_PARAM: &str = "t";
const TOKEN_PARAM: &str = "r";
const TOKEN_LEN: usize = 11;

/// One outbound probe request. Built fresh for every dispatch so that no two
/// requests look alike to a cache in front of the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestDescriptor {
    uri: Uri,
}

impl RequestDescriptor {
    /// Sets `t` and `r` on the target's query. An existing parameter keeps its
    /// position and takes the new value, later duplicates of it are dropped.
    pub fn new(target: &Uri, epoch_ms: u128, token: &str) -> Result<Self, hyper::http::Error> {
        let mut stamps = [
            (TIMESTAMP_PARAM, format!("{TIMESTAMP_PARAM}={epoch_ms}"), false),
            (TOKEN_PARAM, format!("{TOKEN_PARAM}={token}"), false),
        ];
        let mut query: Vec<String> = Vec::new();
        for pair in target.query().unwrap_or_default().split('&') {
            if pair.is_empty() {
                continue;
            }
            let key = pair.split_once('=').map_or(pair, |(k, _)| k);
            match stamps.iter_mut().find(|(name, _, _)| *name == key) {
                Some((_, _, true)) => {}
                Some((_, stamped, placed)) => {
                    *placed = true;
                    query.push(stamped.clone());
                }
                None => query.push(pair.to_string()),
            }
        }
        query.extend(
            stamps
                .into_iter()
                .filter(|(_, _, placed)| !placed)
                .map(|(_, stamped, _)| stamped),
        );

        let path_and_query = PathAndQuery::try_from(format!("{}?{}", target.path(), query.join("&")))?;
        let mut parts = target.clone().into_parts();
        parts.path_and_query = Some(path_and_query);
        Ok(Self {
            uri: Uri::from_parts(parts)?,
        })
    }

    /// Stamped with the current wall clock and a new random token.
    pub fn fresh(target: &Uri) -> Result<Self, hyper::http::Error> {
        Self::new(target, epoch_millis(), &random_token())
    }

    #[inline]
    #[must_use]
    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn into_request(self) -> Result<Request<Full<Bytes>>, hyper::http::Error> {
        Request::get(self.uri)
            .header(CACHE_CONTROL, "no-store")
            .header(ACCEPT, "application/octet-stream")
            .body(empty_body())
    }
}

#[must_use]
pub fn random_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

fn epoch_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn injects_timestamp_and_token() {
        let target = Uri::from_static("http://origin.internal:8081/blob.bin");
        let desc = RequestDescriptor::new(&target, 1_700_000_000_000, "abc123").unwrap();
        assert_eq!(
            "http://origin.internal:8081/blob.bin?t=1700000000000&r=abc123",
            desc.uri().to_string()
        );
    }

    #[test]
    fn keeps_other_params_and_replaces_stale_ones() {
        let target = Uri::from_static("http://origin.internal/x?r=old&size=big&t=1&&tr=keep&t=2");
        let desc = RequestDescriptor::new(&target, 42, "new").unwrap();
        assert_eq!(
            "http://origin.internal/x?r=new&size=big&t=42&tr=keep",
            desc.uri().to_string()
        );
        let target = Uri::from_static("http://origin.internal/x?t=1&size=big");
        let desc = RequestDescriptor::new(&target, 42, "new").unwrap();
        assert_eq!(
            "http://origin.internal/x?t=42&size=big&r=new",
            desc.uri().to_string()
        );
    }

    #[test]
    fn bare_origin_gets_root_path() {
        let target = Uri::from_static("http://origin.internal");
        let desc = RequestDescriptor::new(&target, 7, "tok").unwrap();
        assert_eq!("/?t=7&r=tok", desc.uri().path_and_query().unwrap().as_str());
    }

    #[test]
    fn request_carries_cache_defeating_headers() {
        let target = Uri::from_static("http://origin.internal/");
        let req = RequestDescriptor::fresh(&target).unwrap().into_request().unwrap();
        assert_eq!(hyper::Method::GET, req.method());
        assert_eq!("no-store", req.headers()[CACHE_CONTROL]);
        assert_eq!("application/octet-stream", req.headers()[ACCEPT]);
    }

    #[test]
    fn tokens_are_alphanumeric_and_distinct() {
        let tokens: HashSet<String> = (0..500).map(|_| random_token()).collect();
        assert_eq!(500, tokens.len());
        assert!(tokens
            .iter()
            .all(|t| t.len() == TOKEN_LEN && t.chars().all(|c| c.is_ascii_alphanumeric())));
    }

    #[test]
    fn fresh_descriptors_in_a_batch_differ() {
        let target = Uri::from_static("http://origin.internal/");
        let uris: HashSet<String> = (0..50)
            .map(|_| RequestDescriptor::fresh(&target).unwrap().uri().to_string())
            .collect();
        assert_eq!(50, uris.len());
    }
}
