use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use pt_schemas::TradeEvent;
use serde::{Deserialize, Serialize};

/// Log-driven calibration store. Never updated from in-process trade
/// state — only from re-parsing the tail of `trades.jsonl`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SelfTrustState {
    pub n: u64,
    pub brier_ewma: f64,
    pub overconfidence_ewma: f64,
    pub last_sample_ts: Option<DateTime<Utc>>,
    #[serde(default = "default_alpha")]
    pub alpha: f64,
    #[serde(default)]
    pub last_byte_offset: u64,
    /// Entry confidence of the most recent unmatched open, consumed by the
    /// next close on this (single) trade log.
    #[serde(default)]
    pub open_confidence_cache: Option<f64>,
}

fn default_alpha() -> f64 {
    0.05
}

impl Default for SelfTrustState {
    fn default() -> Self {
        Self {
            n: 0,
            brier_ewma: 0.0,
            overconfidence_ewma: 0.0,
            last_sample_ts: None,
            alpha: default_alpha(),
            last_byte_offset: 0,
            open_confidence_cache: None,
        }
    }
}

impl SelfTrustState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }
}

/// Reads the trade-log tail starting at `last_byte_offset`. Only bytes up
/// to and including the final `\n` are consumed — a dangling partial line
/// (the writer mid-`atomic_append_jsonl`) is left for the next tick rather
/// than discarded or mis-parsed. Returns the complete lines and the new
/// offset.
pub fn read_new_trade_lines(path: &Path, last_byte_offset: u64) -> Result<(Vec<String>, u64)> {
    if !path.exists() {
        return Ok((Vec::new(), last_byte_offset));
    }
    let mut file = File::open(path).with_context(|| format!("open {}", path.display()))?;
    let len = file.metadata()?.len();
    if len <= last_byte_offset {
        return Ok((Vec::new(), last_byte_offset));
    }
    file.seek(SeekFrom::Start(last_byte_offset))?;
    let mut buf = Vec::new();
    file.read_to_end(&mut buf)?;

    let last_newline = match buf.iter().rposition(|&b| b == b'\n') {
        Some(idx) => idx,
        None => return Ok((Vec::new(), last_byte_offset)),
    };
    let complete = &buf[..=last_newline];
    let new_offset = last_byte_offset + complete.len() as u64;
    let text = String::from_utf8_lossy(complete);
    let lines: Vec<String> = text
        .lines()
        .filter(|l| !l.trim().is_empty())
        .map(|l| l.to_string())
        .collect();
    Ok((lines, new_offset))
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationSample {
    pub y: f64,
    pub confidence: f64,
}

/// Parses trade-log lines into `(y, confidence)` calibration samples.
/// Malformed lines are skipped. An open without a `confidence` field
/// clears the cache so the matching close is skipped too (policy
/// violation, not silently mis-scored); an orphan close with no cached
/// confidence falls back to its own `exit_conf` field before being
/// skipped entirely.
pub fn extract_close_samples(
    lines: &[String],
    cache: &mut Option<f64>,
) -> Vec<CalibrationSample> {
    let mut samples = Vec::new();
    for line in lines {
        let event: TradeEvent = match serde_json::from_str(line) {
            Ok(e) => e,
            Err(_) => continue,
        };
        match event {
            TradeEvent::Open(open) => {
                *cache = open.confidence;
            }
            TradeEvent::Close(close) => {
                let confidence = cache.take().or(close.exit_conf);
                if let Some(confidence) = confidence {
                    let y = if close.pct > 0.0 { 1.0 } else { 0.0 };
                    samples.push(CalibrationSample { y, confidence });
                }
            }
        }
    }
    samples
}

/// `self_trust_score = clamp01(1 - sqrt(brier_ewma) - 0.5*overconfidence_ewma)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SelfTrustMetrics {
    pub rmse: f64,
    pub self_trust_score: f64,
}

pub fn update_state_with_samples(
    state: &mut SelfTrustState,
    samples: &[CalibrationSample],
    now_ts: DateTime<Utc>,
) {
    for sample in samples {
        let brier = (sample.confidence - sample.y).powi(2);
        let overconf = if sample.confidence >= 0.60 && sample.y == 0.0 {
            1.0
        } else {
            0.0
        };
        state.brier_ewma = state.alpha * brier + (1.0 - state.alpha) * state.brier_ewma;
        state.overconfidence_ewma =
            state.alpha * overconf + (1.0 - state.alpha) * state.overconfidence_ewma;
        state.n += 1;
        state.last_sample_ts = Some(now_ts);
    }
}

pub fn metrics(state: &SelfTrustState) -> Option<SelfTrustMetrics> {
    if state.n == 0 {
        return None;
    }
    let rmse = state.brier_ewma.sqrt();
    let score = (1.0 - rmse - 0.5 * state.overconfidence_ewma).clamp(0.0, 1.0);
    Some(SelfTrustMetrics {
        rmse,
        self_trust_score: score,
    })
}

/// Orchestrates a full tail-consume cycle: load state, read new lines,
/// extract samples, fold them into the EWMAs, persist, and return the
/// current metrics (`None` while `n == 0`).
pub fn compute_self_trust_from_trade_log(
    state_path: &Path,
    trade_log_path: &Path,
    now_ts: DateTime<Utc>,
) -> Result<Option<SelfTrustMetrics>> {
    let mut state = SelfTrustState::load(state_path)?;
    let (lines, new_offset) = read_new_trade_lines(trade_log_path, state.last_byte_offset)?;
    let samples = extract_close_samples(&lines, &mut state.open_confidence_cache);
    update_state_with_samples(&mut state, &samples, now_ts);
    state.last_byte_offset = new_offset;
    state.save(state_path)?;
    Ok(metrics(&state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_log(path: &Path, lines: &[&str]) {
        let mut f = File::create(path).unwrap();
        for l in lines {
            writeln!(f, "{l}").unwrap();
        }
    }

    #[test]
    fn partial_trailing_line_is_deferred_not_consumed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");
        std::fs::write(&path, "{\"a\":1}\n{\"a\":2").unwrap(); // no trailing newline
        let (lines, offset) = read_new_trade_lines(&path, 0).unwrap();
        assert_eq!(lines, vec!["{\"a\":1}".to_string()]);
        assert_eq!(offset, "{\"a\":1}\n".len() as u64);
    }

    #[test]
    fn second_read_picks_up_where_first_left_off() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");
        std::fs::write(&path, "{\"a\":1}\n").unwrap();
        let (_, offset1) = read_new_trade_lines(&path, 0).unwrap();

        let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
        writeln!(f, "{{\"a\":2}}").unwrap();

        let (lines2, _) = read_new_trade_lines(&path, offset1).unwrap();
        assert_eq!(lines2, vec!["{\"a\":2}".to_string()]);
    }

    #[test]
    fn malformed_line_is_skipped_without_halting() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("trades.jsonl");
        write_log(
            &path,
            &[
                "not json at all",
                "{\"type\":\"open\",\"ts\":\"2026-01-01T00:00:00Z\",\"symbol\":\"ETHUSDT\",\"timeframe\":\"1h\",\"dir\":1,\"entry_px\":100.0,\"risk_mult\":1.0,\"confidence\":0.8}",
                "{\"type\":\"close\",\"ts\":\"2026-01-01T01:00:00Z\",\"pct\":1.0,\"fee_bps\":6.0,\"slip_bps\":2.0}",
            ],
        );
        let (lines, _) = read_new_trade_lines(&path, 0).unwrap();
        let mut cache = None;
        let samples = extract_close_samples(&lines, &mut cache);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].confidence, 0.8);
        assert_eq!(samples[0].y, 1.0);
    }

    #[test]
    fn self_trust_score_is_null_while_n_is_zero() {
        let state = SelfTrustState::default();
        assert_eq!(metrics(&state), None);
    }

    #[test]
    fn alternating_win_loss_at_fixed_confidence_converges_as_expected() {
        // Mirrors the seeded end-to-end scenario: confidence always 0.8,
        // outcomes alternate win/loss across 10 paired events.
        let mut state = SelfTrustState::default();
        let now = Utc::now();
        for i in 0..10 {
            let y = if i % 2 == 0 { 1.0 } else { 0.0 };
            let sample = CalibrationSample { y, confidence: 0.8 };
            update_state_with_samples(&mut state, &[sample], now);
        }
        let m = metrics(&state).unwrap();
        assert!((state.brier_ewma - 0.25).abs() < 0.05);
        assert!((state.overconfidence_ewma - 0.5).abs() < 0.05);
        assert!(m.self_trust_score >= 0.0 && m.self_trust_score <= 1.0);
    }

    #[test]
    fn orphan_close_falls_back_to_its_own_exit_conf_field() {
        let line = "{\"type\":\"close\",\"ts\":\"2026-01-01T01:00:00Z\",\"pct\":-1.0,\"fee_bps\":6.0,\"slip_bps\":2.0,\"exit_conf\":0.7}";
        let mut cache = None;
        let samples = extract_close_samples(&[line.to_string()], &mut cache);
        assert_eq!(samples.len(), 1);
        assert_eq!(samples[0].confidence, 0.7);
    }

    #[test]
    fn close_with_no_confidence_anywhere_is_skipped() {
        let line = "{\"type\":\"close\",\"ts\":\"2026-01-01T01:00:00Z\",\"pct\":-1.0,\"fee_bps\":6.0,\"slip_bps\":2.0}";
        let mut cache = None;
        let samples = extract_close_samples(&[line.to_string()], &mut cache);
        assert!(samples.is_empty());
    }
}
