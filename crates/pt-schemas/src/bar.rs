use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One OHLCV record for a single interval of a timeframe.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    pub ts: DateTime<Utc>,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// Metadata about an OHLCV fetch: which source answered and how stale the
/// newest bar is relative to the fetch time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FetchMeta {
    pub source: String,
    pub newest_bar_age_s: f64,
    pub trimmed_incomplete_bar: bool,
}

/// Parses a timeframe string like `"1m"`, `"15m"`, `"1h"`, `"1d"` into
/// seconds. Mirrors the numeric-prefix + unit-suffix convention used
/// throughout the on-disk provider tables.
pub fn timeframe_seconds(timeframe: &str) -> Option<i64> {
    let timeframe = timeframe.trim();
    let split_at = timeframe.find(|c: char| !c.is_ascii_digit())?;
    let (digits, unit) = timeframe.split_at(split_at);
    let n: i64 = digits.parse().ok()?;
    let mult = match unit {
        "s" => 1,
        "m" => 60,
        "h" => 3600,
        "d" => 86400,
        _ => return None,
    };
    Some(n * mult)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_common_timeframes() {
        assert_eq!(timeframe_seconds("1m"), Some(60));
        assert_eq!(timeframe_seconds("15m"), Some(900));
        assert_eq!(timeframe_seconds("1h"), Some(3600));
        assert_eq!(timeframe_seconds("1d"), Some(86400));
    }

    #[test]
    fn rejects_unknown_units() {
        assert_eq!(timeframe_seconds("1x"), None);
        assert_eq!(timeframe_seconds("bogus"), None);
    }
}
