use pt_config::EntryConfig;

use crate::state::Position;

/// Effective entry threshold: the configured per-profile `entry_min_conf`,
/// softened by `defensive_softening` whenever `risk_mult < 1.0`. Softening
/// and the separate size-scaling use of `risk_mult` both apply — this is
/// not an either/or.
pub fn effective_entry_min_conf(entry_min_conf: f64, risk_mult: f64, defensive_softening: f64) -> f64 {
    if risk_mult < 1.0 {
        (entry_min_conf - defensive_softening).max(0.0)
    } else {
        entry_min_conf
    }
}

/// Would a full open attempt be allowed right now, independent of whether
/// a position is already open? Drives opportunity-density eligibility.
pub fn is_entry_eligible(
    entry_cfg: &EntryConfig,
    regime: &str,
    final_dir: i8,
    final_conf: f64,
    entry_min_conf: f64,
    risk_mult: f64,
    defensive_softening: f64,
) -> bool {
    if !entry_cfg.allow_opens {
        return false;
    }
    if !entry_cfg.regime_allows_entry(regime) {
        return false;
    }
    if final_dir == 0 {
        return false;
    }
    final_conf >= effective_entry_min_conf(entry_min_conf, risk_mult, defensive_softening)
}

/// Attempts to open a new position from flat. Returns the new position iff
/// eligible and not already holding the same direction.
pub fn try_open(
    current: Option<&Position>,
    entry_cfg: &EntryConfig,
    regime: &str,
    final_dir: i8,
    final_conf: f64,
    entry_px: f64,
    entry_min_conf: f64,
    risk_mult: f64,
    defensive_softening: f64,
) -> Option<Position> {
    if !is_entry_eligible(
        entry_cfg,
        regime,
        final_dir,
        final_conf,
        entry_min_conf,
        risk_mult,
        defensive_softening,
    ) {
        return None;
    }
    if let Some(pos) = current {
        if pos.dir == final_dir {
            return None;
        }
    }
    Some(Position::open(final_dir, entry_px, risk_mult, final_conf))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defensive_mode_softens_the_threshold_by_the_configured_amount() {
        assert_eq!(effective_entry_min_conf(0.58, 0.70, 0.07), 0.51);
        assert_eq!(effective_entry_min_conf(0.58, 1.0, 0.07), 0.58);
    }

    #[test]
    fn softening_never_drives_the_threshold_negative() {
        assert_eq!(effective_entry_min_conf(0.05, 0.5, 0.07), 0.0);
    }

    #[test]
    fn blocked_regime_rejects_entry_even_with_high_confidence() {
        let cfg = EntryConfig::default();
        assert!(!is_entry_eligible(&cfg, "chop", 1, 0.99, 0.58, 1.0, 0.07));
    }

    #[test]
    fn neutral_direction_is_never_eligible() {
        let cfg = EntryConfig::default();
        assert!(!is_entry_eligible(&cfg, "trend_down", 0, 0.99, 0.58, 1.0, 0.07));
    }

    #[test]
    fn duplicate_direction_open_is_refused() {
        let cfg = EntryConfig::default();
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let opened = try_open(Some(&pos), &cfg, "trend_down", 1, 0.9, 101.0, 0.58, 1.0, 0.07);
        assert!(opened.is_none());
    }

    #[test]
    fn a_fresh_eligible_open_succeeds_from_flat() {
        let cfg = EntryConfig::default();
        let opened = try_open(None, &cfg, "trend_down", -1, 0.9, 100.0, 0.58, 1.0, 0.07);
        assert_eq!(opened.unwrap().dir, -1);
    }
}
