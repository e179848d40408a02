use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use pt_schemas::Bar;
use serde::{Deserialize, Serialize};

pub fn sma(values: &[f64], n: usize) -> Option<f64> {
    if values.len() < n || n == 0 {
        return None;
    }
    let tail = &values[values.len() - n..];
    Some(tail.iter().sum::<f64>() / n as f64)
}

/// Population standard deviation (matches the Python reference, which
/// uses `statistics.stdev`-equivalent population semantics over a fixed
/// trailing window rather than a sample correction).
pub fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

pub fn true_range(prev_close: f64, high: f64, low: f64) -> f64 {
    (high - low)
        .max((high - prev_close).abs())
        .max((low - prev_close).abs())
}

/// Average True Range over the last `n` bars.
pub fn atr(bars: &[Bar], n: usize) -> Option<f64> {
    if bars.len() < n + 1 {
        return None;
    }
    let trs: Vec<f64> = bars
        .windows(2)
        .map(|w| true_range(w[0].close, w[1].high, w[1].low))
        .collect();
    sma(&trs, n)
}

pub fn atr_percent(bars: &[Bar], n: usize) -> Option<f64> {
    let last_close = bars.last()?.close;
    if last_close == 0.0 {
        return None;
    }
    atr(bars, n).map(|a| a / last_close * 100.0)
}

/// Bollinger-band width as a percentage of the midline:
/// `(upper - lower) / mid * 100` where `upper/lower = sma ± k*stdev`.
pub fn bb_width_percent(closes: &[f64], n: usize, k: f64) -> Option<f64> {
    let mid = sma(closes, n)?;
    if mid == 0.0 {
        return None;
    }
    let tail = &closes[closes.len() - n..];
    let sd = stdev(tail);
    let width = 2.0 * k * sd;
    Some(width / mid * 100.0)
}

/// Clamped ratio of current reading to its longer-window baseline.
pub fn compression_ratio(current: f64, baseline: f64) -> f64 {
    if baseline <= 0.0 {
        return 0.0;
    }
    (current / baseline).clamp(0.0, 2.0)
}

fn component_compression(ratio: f64) -> f64 {
    if ratio <= 1.0 {
        (1.0 - ratio).max(0.0)
    } else {
        0.0
    }
}

/// `s = 0.5 * c_atr + 0.5 * c_bb`, each component in [0, 1].
pub fn score_compression(atr_ratio: f64, bb_ratio: f64) -> f64 {
    0.5 * component_compression(atr_ratio) + 0.5 * component_compression(bb_ratio)
}

/// `{in_compression, entered_ts, last_ts}`. `entered_ts` is non-null iff
/// `in_compression` is true.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CompressionState {
    pub in_compression: bool,
    pub entered_ts: Option<DateTime<Utc>>,
    pub last_ts: Option<DateTime<Utc>>,
}

impl CompressionState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }
}

pub const DEFAULT_COMPRESSION_THRESHOLD: f64 = 0.6;

/// Updates compression-state transitions and returns the elapsed
/// time-in-compression in seconds (`None` just after leaving, `0.0` on
/// entering, growing while staying compressed).
pub fn update_time_in_compression(
    state: &mut CompressionState,
    ts: DateTime<Utc>,
    is_compressed: bool,
) -> Option<f64> {
    match (state.in_compression, is_compressed) {
        (false, true) => {
            state.in_compression = true;
            state.entered_ts = Some(ts);
            state.last_ts = Some(ts);
            Some(0.0)
        }
        (true, true) => {
            state.last_ts = Some(ts);
            let entered = state.entered_ts.expect("in_compression implies entered_ts");
            Some((ts - entered).num_milliseconds() as f64 / 1000.0)
        }
        (_, false) => {
            state.in_compression = false;
            state.entered_ts = None;
            state.last_ts = Some(ts);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn sma_requires_enough_values() {
        assert_eq!(sma(&[1.0, 2.0], 3), None);
        assert_eq!(sma(&[1.0, 2.0, 3.0], 3), Some(2.0));
    }

    #[test]
    fn stdev_of_constant_series_is_zero() {
        assert_eq!(stdev(&[5.0, 5.0, 5.0]), 0.0);
    }

    #[test]
    fn compression_ratio_is_clamped_to_two() {
        assert_eq!(compression_ratio(10.0, 1.0), 2.0);
        assert_eq!(compression_ratio(-5.0, 1.0), 0.0);
    }

    #[test]
    fn score_is_one_when_fully_compressed() {
        assert_eq!(score_compression(0.0, 0.0), 1.0);
    }

    #[test]
    fn score_is_zero_when_ratio_above_baseline() {
        assert_eq!(score_compression(1.5, 1.5), 0.0);
    }

    #[test]
    fn entering_compression_resets_elapsed_to_zero() {
        let mut state = CompressionState::default();
        let t0 = Utc::now();
        let elapsed = update_time_in_compression(&mut state, t0, true);
        assert_eq!(elapsed, Some(0.0));
        assert!(state.in_compression);
        assert_eq!(state.entered_ts, Some(t0));
    }

    #[test]
    fn staying_compressed_accumulates_elapsed_time() {
        let mut state = CompressionState::default();
        let t0 = Utc::now();
        update_time_in_compression(&mut state, t0, true);
        let t1 = t0 + Duration::seconds(120);
        let elapsed = update_time_in_compression(&mut state, t1, true);
        assert_eq!(elapsed, Some(120.0));
    }

    #[test]
    fn leaving_compression_clears_entered_ts_and_returns_none() {
        let mut state = CompressionState::default();
        let t0 = Utc::now();
        update_time_in_compression(&mut state, t0, true);
        let t1 = t0 + Duration::seconds(30);
        let elapsed = update_time_in_compression(&mut state, t1, false);
        assert_eq!(elapsed, None);
        assert!(!state.in_compression);
        assert_eq!(state.entered_ts, None);
    }
}
