use pt_config::AccountingConfig;

/// Raw price-based PnL in percentage points: `(exit - entry)/entry * dir * 100`.
pub fn raw_pnl_pct(entry_px: f64, exit_px: f64, dir: i8) -> f64 {
    if entry_px == 0.0 {
        return 0.0;
    }
    ((exit_px - entry_px) / entry_px) * dir as f64 * 100.0
}

/// Fee + slippage accounting charged on every close, in percentage points.
/// bps -> pp is a divide by 100 (100 bps = 1 percentage point); the fee is
/// doubled for the round trip (entry + exit).
pub fn accounting_cost_pct(accounting: &AccountingConfig) -> f64 {
    (2.0 * accounting.taker_fee_bps + accounting.slip_bps) / 100.0
}

/// Net PnL after accounting, and whether it's a scratch (net magnitude
/// under `scratch_threshold_bps`).
pub fn net_pnl(entry_px: f64, exit_px: f64, dir: i8, accounting: &AccountingConfig, scratch_threshold_bps: f64) -> (f64, bool) {
    let net_pct = raw_pnl_pct(entry_px, exit_px, dir) - accounting_cost_pct(accounting);
    let is_scratch = net_pct.abs() < scratch_threshold_bps / 100.0;
    (net_pct, is_scratch)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn a_favorable_long_move_is_a_positive_raw_pnl() {
        assert!((raw_pnl_pct(100.0, 101.0, 1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn a_favorable_short_move_flips_the_sign_via_dir() {
        assert!((raw_pnl_pct(100.0, 99.0, -1) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn accounting_cost_doubles_the_taker_fee_for_the_round_trip() {
        let accounting = AccountingConfig { taker_fee_bps: 6.0, slip_bps: 2.0 };
        assert!((accounting_cost_pct(&accounting) - 0.14).abs() < 1e-9);
    }

    #[test]
    fn a_tiny_net_move_is_classified_as_a_scratch() {
        let accounting = AccountingConfig { taker_fee_bps: 0.0, slip_bps: 0.0 };
        let (net, scratch) = net_pnl(100.0, 100.02, 1, &accounting, 5.0);
        assert!((net - 0.02).abs() < 1e-9);
        assert!(scratch);
    }

    #[test]
    fn a_large_net_move_is_not_a_scratch() {
        let accounting = AccountingConfig { taker_fee_bps: 0.0, slip_bps: 0.0 };
        let (_, scratch) = net_pnl(100.0, 102.0, 1, &accounting, 5.0);
        assert!(!scratch);
    }
}
