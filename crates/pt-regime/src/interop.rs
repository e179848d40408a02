use crate::history::RollingWindow;

const HISTORY_WINDOW: usize = 100;
const VOL_Z_THRESHOLD: f64 = 0.8;
const TREND_Z_THRESHOLD: f64 = 0.6;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InteropRegime {
    Trend,
    Chop,
    HighVol,
}

impl InteropRegime {
    pub fn as_str(&self) -> &'static str {
        match self {
            InteropRegime::Trend => "trend",
            InteropRegime::Chop => "chop",
            InteropRegime::HighVol => "high_vol",
        }
    }
}

#[derive(Clone, Copy, Debug)]
pub struct InteropReading {
    pub regime: InteropRegime,
    pub atrp_z: f64,
    pub bb_width_z: f64,
    pub ret_g5_z: f64,
}

/// Three-label z-score-only classifier kept for interop with older
/// downstream tooling. It does not feed the council — `PrimaryClassifier`
/// does that.
pub struct InteropClassifier {
    atrp_history: RollingWindow,
    bb_width_history: RollingWindow,
    ret_g5_history: RollingWindow,
}

impl InteropClassifier {
    pub fn new() -> Self {
        Self {
            atrp_history: RollingWindow::new(HISTORY_WINDOW),
            bb_width_history: RollingWindow::new(HISTORY_WINDOW),
            ret_g5_history: RollingWindow::new(HISTORY_WINDOW),
        }
    }

    pub fn classify(&mut self, atrp: f64, bb_width: f64, ret_g5: f64) -> InteropReading {
        let atrp_z = self.atrp_history.push_and_zscore(atrp);
        let bb_width_z = self.bb_width_history.push_and_zscore(bb_width);
        let ret_g5_z = self.ret_g5_history.push_and_zscore(ret_g5.abs());

        let regime = if atrp_z.abs() > VOL_Z_THRESHOLD || bb_width_z.abs() > VOL_Z_THRESHOLD {
            InteropRegime::HighVol
        } else if ret_g5_z.abs() > TREND_Z_THRESHOLD {
            InteropRegime::Trend
        } else {
            InteropRegime::Chop
        };

        InteropReading {
            regime,
            atrp_z,
            bb_width_z,
            ret_g5_z,
        }
    }
}

impl Default for InteropClassifier {
    fn default() -> Self {
        Self::new()
    }
}
