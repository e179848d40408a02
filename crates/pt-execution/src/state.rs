use serde::{Deserialize, Serialize};

/// In-memory position for one (symbol, timeframe) pair. The loop is the
/// only writer; there is no on-disk position state; `trades.jsonl` is the
/// durable record and `bars_open` is reconstructed fresh on restart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub dir: i8,
    pub entry_px: f64,
    pub bars_open: u32,
    pub risk_mult: f64,
    pub entry_conf: f64,
}

impl Position {
    pub fn open(dir: i8, entry_px: f64, risk_mult: f64, entry_conf: f64) -> Self {
        Self {
            dir,
            entry_px,
            bars_open: 0,
            risk_mult,
            entry_conf,
        }
    }

    pub fn is_flat(&self) -> bool {
        self.dir == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_freshly_opened_position_starts_at_zero_bars_open() {
        let p = Position::open(1, 100.0, 1.0, 0.6);
        assert_eq!(p.bars_open, 0);
        assert!(!p.is_flat());
    }
}
