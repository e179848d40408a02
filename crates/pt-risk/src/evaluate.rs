use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pt_schemas::Paths;

use crate::bands::{bounded_mult, select_band};
use crate::drawdown::{compute_drawdown, read_equity_curve};
use crate::pf::{profit_factor, read_recent_closes};

/// Single evaluation of the drawdown/risk-band adapter, written to
/// `risk_adapter.json` (latest) and appended to `risk_adapter.jsonl` (history).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RiskEvaluation {
    pub ts: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equity: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub peak: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub drawdown: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,
    pub mult: f64,
    pub reason: String,
}

const NEUTRAL_MULT: f64 = 1.0;

// PAPER-only promotion windows: (lookback trades, min samples, max drawdown, min pf).
const C_TO_B_LOOKBACK: usize = 30;
const C_TO_B_MIN_SAMPLES: usize = 20;
const C_TO_B_MAX_DD: f64 = 0.08;
const C_TO_B_MIN_PF: f64 = 1.05;

const B_TO_A_LOOKBACK: usize = 50;
const B_TO_A_MIN_SAMPLES: usize = 40;
const B_TO_A_MAX_DD: f64 = 0.05;
const B_TO_A_MIN_PF: f64 = 1.15;

const B_TO_A_RECENT_LOOKBACK: usize = 20;
const B_TO_A_RECENT_MIN_SAMPLES: usize = 15;
const B_TO_A_RECENT_MIN_PF: f64 = 1.10;

pub fn evaluate(
    equity_path: &Path,
    trades_path: &Path,
    now: DateTime<Utc>,
    is_paper_mode: bool,
) -> Result<RiskEvaluation> {
    let points = read_equity_curve(equity_path)?;
    let Some((equity, peak, drawdown)) = compute_drawdown(&points) else {
        return Ok(RiskEvaluation {
            ts: now,
            equity: None,
            peak: None,
            drawdown: None,
            band: None,
            mult: NEUTRAL_MULT,
            reason: "no_equity_curve".to_string(),
        });
    };

    let (mut band, mut mult) = select_band(drawdown);
    let mut reason = format!("band_{}", band.to_lowercase());

    if is_paper_mode {
        if band == "C" {
            let (promoted, promo_reason) = evaluate_c_to_b(trades_path, drawdown)?;
            if promoted {
                band = "B";
                mult = crate::bands::BANDS[1].2;
                reason = promo_reason;
            }
        }
        if band == "B" {
            let (promoted, promo_reason) = evaluate_b_to_a(trades_path, drawdown)?;
            if promoted {
                band = "A";
                mult = crate::bands::BANDS[0].2;
                reason = promo_reason;
            }
        }
    }

    let mult = bounded_mult(mult);

    Ok(RiskEvaluation {
        ts: now,
        equity: Some(equity),
        peak: Some(peak),
        drawdown: Some(drawdown),
        band: Some(band.to_string()),
        mult,
        reason,
    })
}

/// Runs `evaluate` against the canonical state layout and persists the
/// result to `risk_adapter.json` (latest) and `risk_adapter.jsonl`
/// (history), mirroring the Python reference's every-tick write.
pub fn run(paths: &Paths, now: DateTime<Utc>) -> Result<RiskEvaluation> {
    let eval = evaluate(
        &paths.equity_curve(),
        &paths.trades(),
        now,
        paths.mode().is_paper(),
    )?;
    pt_io::atomic_write_json(&paths.risk_adapter_json(), &eval)?;
    pt_io::atomic_append_jsonl(&paths.risk_adapter_jsonl(), &eval)?;
    Ok(eval)
}

fn evaluate_c_to_b(trades_path: &Path, drawdown: f64) -> Result<(bool, String)> {
    if drawdown >= C_TO_B_MAX_DD {
        return Ok((false, "band_c".to_string()));
    }
    let pcts = read_recent_closes(trades_path, C_TO_B_LOOKBACK)?;
    let (pf, count) = profit_factor(&pcts);
    let Some(pf) = pf else {
        return Ok((true, "promoted_c_to_b_no_pf_data".to_string()));
    };
    if count >= C_TO_B_MIN_SAMPLES && pf >= C_TO_B_MIN_PF {
        Ok((true, "promoted_c_to_b_pf_gate".to_string()))
    } else {
        Ok((false, "band_c".to_string()))
    }
}

fn evaluate_b_to_a(trades_path: &Path, drawdown: f64) -> Result<(bool, String)> {
    if drawdown >= B_TO_A_MAX_DD {
        return Ok((false, "band_b".to_string()));
    }
    let long_pcts = read_recent_closes(trades_path, B_TO_A_LOOKBACK)?;
    let (long_pf, long_count) = profit_factor(&long_pcts);
    let recent_pcts = read_recent_closes(trades_path, B_TO_A_RECENT_LOOKBACK)?;
    let (recent_pf, recent_count) = profit_factor(&recent_pcts);

    let long_ok = long_count >= B_TO_A_MIN_SAMPLES
        && long_pf.map(|pf| pf >= B_TO_A_MIN_PF).unwrap_or(false);
    let recent_ok = recent_count >= B_TO_A_RECENT_MIN_SAMPLES
        && recent_pf.map(|pf| pf >= B_TO_A_RECENT_MIN_PF).unwrap_or(false);

    if long_ok && recent_ok {
        Ok((true, "promoted_b_to_a_pf_gate".to_string()))
    } else {
        Ok((false, "band_b".to_string()))
    }
}
