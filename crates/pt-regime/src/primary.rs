use pt_primitives::compression::{atr_percent, bb_width_percent};
use pt_schemas::Bar;

use crate::history::RollingWindow;

pub const DEFAULT_PANIC_THRESHOLD: f64 = -0.03;
const ATR_PERIOD: usize = 14;
const BB_PERIOD: usize = 20;
const RET_G5_LOOKBACK: usize = 5;
const VOL_Z_THRESHOLD: f64 = 1.5;
const TREND_Z_THRESHOLD: f64 = 0.6;
const HISTORY_WINDOW: usize = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Regime {
    TrendUp,
    TrendDown,
    Chop,
    HighVol,
    PanicDown,
    Unknown,
}

impl Regime {
    pub fn as_str(&self) -> &'static str {
        match self {
            Regime::TrendUp => "trend_up",
            Regime::TrendDown => "trend_down",
            Regime::Chop => "chop",
            Regime::HighVol => "high_vol",
            Regime::PanicDown => "panic_down",
            Regime::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for Regime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Clone, Copy, Debug)]
pub struct RegimeReading {
    pub regime: Regime,
    pub atrp_z: f64,
    pub bb_width_z: f64,
    pub ret_g5: f64,
    pub ret_g5_z: f64,
}

fn unknown_reading() -> RegimeReading {
    RegimeReading {
        regime: Regime::Unknown,
        atrp_z: 0.0,
        bb_width_z: 0.0,
        ret_g5: 0.0,
        ret_g5_z: 0.0,
    }
}

/// Bar-based classifier into the full six-label regime set. Every call
/// that yields `Unknown` leaves the rolling histories untouched so a gap
/// in data never pollutes the z-score baseline.
pub struct PrimaryClassifier {
    atrp_history: RollingWindow,
    bb_width_history: RollingWindow,
    ret_g5_history: RollingWindow,
    panic_threshold: f64,
}

impl PrimaryClassifier {
    pub fn new(panic_threshold: f64) -> Self {
        Self {
            atrp_history: RollingWindow::new(HISTORY_WINDOW),
            bb_width_history: RollingWindow::new(HISTORY_WINDOW),
            ret_g5_history: RollingWindow::new(HISTORY_WINDOW),
            panic_threshold,
        }
    }

    fn min_bars_required(&self) -> usize {
        (ATR_PERIOD + 1).max(BB_PERIOD).max(RET_G5_LOOKBACK + 1)
    }

    pub fn classify(&mut self, bars: &[Bar], trimmed_incomplete_bar: bool) -> RegimeReading {
        if trimmed_incomplete_bar || bars.len() < self.min_bars_required() {
            return unknown_reading();
        }

        let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
        let (Some(atrp), Some(bb_width)) = (
            atr_percent(bars, ATR_PERIOD),
            bb_width_percent(&closes, BB_PERIOD, 2.0),
        ) else {
            return unknown_reading();
        };

        let last = closes[closes.len() - 1];
        let prior = closes[closes.len() - 1 - RET_G5_LOOKBACK];
        let ret_g5 = if prior == 0.0 { 0.0 } else { (last - prior) / prior };

        let atrp_z = self.atrp_history.push_and_zscore(atrp);
        let bb_width_z = self.bb_width_history.push_and_zscore(bb_width);
        let ret_g5_z = self.ret_g5_history.push_and_zscore(ret_g5);

        let regime = if atrp_z.abs() > VOL_Z_THRESHOLD || bb_width_z.abs() > VOL_Z_THRESHOLD {
            Regime::HighVol
        } else if ret_g5 <= self.panic_threshold {
            Regime::PanicDown
        } else if ret_g5_z.abs() > TREND_Z_THRESHOLD {
            if ret_g5 >= 0.0 {
                Regime::TrendUp
            } else {
                Regime::TrendDown
            }
        } else {
            Regime::Chop
        };

        RegimeReading {
            regime,
            atrp_z,
            bb_width_z,
            ret_g5,
            ret_g5_z,
        }
    }
}

impl Default for PrimaryClassifier {
    fn default() -> Self {
        Self::new(DEFAULT_PANIC_THRESHOLD)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn bar(i: i64, close: f64) -> Bar {
        Bar {
            ts: Utc.timestamp_opt(1_700_000_000 + i * 60, 0).unwrap(),
            open: close,
            high: close + 0.5,
            low: close - 0.5,
            close,
            volume: 10.0,
        }
    }

    fn flat_bars(n: usize, close: f64) -> Vec<Bar> {
        (0..n as i64).map(|i| bar(i, close)).collect()
    }

    #[test]
    fn too_few_bars_is_unknown() {
        let mut c = PrimaryClassifier::default();
        let bars = flat_bars(5, 100.0);
        assert_eq!(c.classify(&bars, false).regime, Regime::Unknown);
    }

    #[test]
    fn trimmed_incomplete_bar_is_unknown_regardless_of_bar_count() {
        let mut c = PrimaryClassifier::default();
        let bars = flat_bars(50, 100.0);
        assert_eq!(c.classify(&bars, true).regime, Regime::Unknown);
    }

    #[test]
    fn a_sharp_drop_never_reads_as_a_calm_regime() {
        let mut c = PrimaryClassifier::default();
        let mut bars = flat_bars(30, 100.0);
        // Warm up the rolling histories on flat data first.
        for _ in 0..5 {
            c.classify(&bars, false);
        }
        let n = bars.len();
        bars[n - 1].close = 90.0; // -10% in one bar
        let reading = c.classify(&bars, false);
        // A move this sharp must never read as trend/chop — either the
        // volatility override or the panic threshold has to fire.
        assert!(matches!(reading.regime, Regime::PanicDown | Regime::HighVol));
    }

    #[test]
    fn flat_unchanging_prices_settle_into_chop() {
        let mut c = PrimaryClassifier::default();
        let bars = flat_bars(40, 100.0);
        let mut last = unknown_reading();
        for _ in 0..10 {
            last = c.classify(&bars, false);
        }
        assert_eq!(last.regime, Regime::Chop);
    }
}
