use hyper::Uri;
use probe_util::ProbeQuery;

pub const DEFAULT_DURATION_MS: u64 = 8_000;
pub const MAX_DURATION_MS: u64 = 10_000;
pub const DEFAULT_RPS: u64 = 20;
pub const MAX_RPS: u64 = 50;

/// Effective parameters of one probe run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub target: Uri,
    /// Always within `0..=MAX_DURATION_MS`.
    pub duration_ms: u64,
    /// Requests per window, always within `0..=MAX_RPS`.
    pub rps: u64,
}

impl RunConfig {
    /// `target` comes from process configuration, never from the query.
    #[must_use]
    pub fn from_query(query: &ProbeQuery, target: &Uri) -> Self {
        let duration = coerce(query.dur.as_deref(), DEFAULT_DURATION_MS, MAX_DURATION_MS);
        let rps = coerce(query.rps.as_deref(), DEFAULT_RPS, MAX_RPS);
        Self {
            target: target.clone(),
            duration_ms: duration.trunc() as u64,
            // A fractional rate still launches a whole request for the remainder
            rps: rps.ceil() as u64,
        }
    }
}

/// Malformed input is never rejected, it falls back to the default just like
/// an absent value.
fn coerce(raw: Option<&str>, default: u64, max: u64) -> f64 {
    raw.filter(|s| !s.is_empty())
        .and_then(parse_number)
        .unwrap_or(default as f64)
        .clamp(0.0, max as f64)
}

/// Numeric string grammar of the trigger parameters: blank means zero,
/// `0x`/`0o`/`0b` integer literals, decimals with an optional exponent, and
/// `Infinity` as the only spelling of infinity. `None` for anything else.
fn parse_number(raw: &str) -> Option<f64> {
    let s = raw.trim();
    if s.is_empty() {
        return Some(0.0);
    }
    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() {
            return None;
        }
        return digits.chars().try_fold(0.0_f64, |acc, c| {
            c.to_digit(radix).map(|d| acc * f64::from(radix) + f64::from(d))
        });
    }
    let unsigned = s.strip_prefix(['+', '-']).unwrap_or(s);
    if unsigned == "Infinity" {
        return Some(if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        });
    }
    // `str::parse` also takes `inf`/`nan` in any case, which are not numbers here
    if unsigned.starts_with(|c: char| c.is_ascii_alphabetic()) {
        return None;
    }
    s.parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn target() -> Uri {
        Uri::from_static("http://origin.internal/blob.bin")
    }

    fn cfg(dur: Option<&str>, rps: Option<&str>) -> RunConfig {
        let query = ProbeQuery::new(dur.map(str::to_string), rps.map(str::to_string));
        RunConfig::from_query(&query, &target())
    }

    #[test]
    fn absent_params_use_defaults() {
        let c = cfg(None, None);
        assert_eq!(DEFAULT_DURATION_MS, c.duration_ms);
        assert_eq!(DEFAULT_RPS, c.rps);
        assert_eq!(target(), c.target);
    }

    #[test]
    fn in_range_values_pass_through() {
        for dur in [1u64, 999, 3000, 10_000] {
            assert_eq!(dur, cfg(Some(&dur.to_string()), None).duration_ms);
        }
        for rps in [1u64, 5, 49, 50] {
            assert_eq!(rps, cfg(None, Some(&rps.to_string())).rps);
        }
    }

    #[test]
    fn values_above_ceiling_are_clamped() {
        let c = cfg(Some("99999"), Some("999"));
        assert_eq!(MAX_DURATION_MS, c.duration_ms);
        assert_eq!(MAX_RPS, c.rps);
        let c = cfg(Some("Infinity"), Some("+Infinity"));
        assert_eq!(MAX_DURATION_MS, c.duration_ms);
        assert_eq!(MAX_RPS, c.rps);
        assert_eq!(0, cfg(Some("-Infinity"), None).duration_ms);
    }

    #[test]
    fn malformed_values_fall_back_to_defaults() {
        for junk in [
            "", "abc", "12ms", "NaN", "nan", "inf", "INF", "infinity", "-inf", "0x", "0xZZ",
            "-0x10", "1_000",
        ] {
            let c = cfg(Some(junk), Some(junk));
            assert_eq!(DEFAULT_DURATION_MS, c.duration_ms, "dur={junk:?}");
            assert_eq!(DEFAULT_RPS, c.rps, "rps={junk:?}");
        }
    }

    #[test]
    fn radix_literals_are_numbers() {
        let c = cfg(Some("0x10"), Some("0b11"));
        assert_eq!(16, c.duration_ms);
        assert_eq!(3, c.rps);
        assert_eq!(511, cfg(Some("0o777"), None).duration_ms);
        assert_eq!(MAX_DURATION_MS, cfg(Some("0XFFFFFFFF"), None).duration_ms);
    }

    #[test]
    fn blank_values_mean_zero() {
        let c = cfg(Some("   "), Some("\t"));
        assert_eq!(0, c.duration_ms);
        assert_eq!(0, c.rps);
    }

    #[test]
    fn zero_and_negative_values_mean_no_windows() {
        assert_eq!(0, cfg(Some("0"), None).duration_ms);
        assert_eq!(0, cfg(Some("-250"), None).duration_ms);
        assert_eq!(0, cfg(None, Some("-3")).rps);
    }

    #[test]
    fn fractional_values() {
        let c = cfg(Some(" 2500.9 "), Some("2.5"));
        assert_eq!(2500, c.duration_ms);
        assert_eq!(3, c.rps);
        assert_eq!(1500, cfg(Some("1.5e3"), None).duration_ms);
    }
}
