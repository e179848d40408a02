use pt_config::ExitConfig;

use crate::state::Position;

/// Exit reasons in their pinned evaluation priority — `StopLoss` is checked
/// first, `Drop` last. Not runtime-configurable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExitReason {
    StopLoss,
    Timeout,
    TakeProfit,
    Reverse,
    Drop,
}

impl ExitReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExitReason::StopLoss => "stop_loss",
            ExitReason::Timeout => "timeout",
            ExitReason::TakeProfit => "take_profit",
            ExitReason::Reverse => "reverse",
            ExitReason::Drop => "drop",
        }
    }
}

/// Signed, direction-adjusted price move: positive when favorable to
/// `position.dir`, negative when adverse.
fn signed_move(position: &Position, price: f64) -> f64 {
    if position.entry_px == 0.0 {
        return 0.0;
    }
    ((price - position.entry_px) / position.entry_px) * position.dir as f64
}

/// Evaluates the fixed exit-condition cascade against an open position.
/// `final_dir`/`final_conf` are the current tick's council output; `price`
/// is the latest close.
pub fn evaluate_exit(
    position: &Position,
    final_dir: i8,
    final_conf: f64,
    price: f64,
    gates_exit_min_conf: f64,
    gates_reverse_min_conf: f64,
    exit_cfg: &ExitConfig,
) -> Option<ExitReason> {
    let counter_direction = final_dir != 0 && final_dir != position.dir;
    let same_direction = final_dir == position.dir;
    let move_signed = signed_move(position, price);
    let adverse_move = -move_signed;

    if counter_direction
        && final_conf >= gates_reverse_min_conf
        && adverse_move >= exit_cfg.stop_loss_price_frac
    {
        return Some(ExitReason::StopLoss);
    }

    if position.bars_open >= exit_cfg.decay_bars {
        return Some(ExitReason::Timeout);
    }

    if same_direction
        && final_conf >= exit_cfg.take_profit_conf_min
        && move_signed >= exit_cfg.take_profit_price_rmult_min
    {
        return Some(ExitReason::TakeProfit);
    }

    if counter_direction && final_conf >= gates_reverse_min_conf {
        return Some(ExitReason::Reverse);
    }

    if final_conf < gates_exit_min_conf {
        return Some(ExitReason::Drop);
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn exit_cfg() -> ExitConfig {
        ExitConfig::default()
    }

    #[test]
    fn a_sharp_adverse_move_with_high_counter_confidence_is_a_stop_loss() {
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let reason = evaluate_exit(&pos, -1, 0.80, 98.0, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }

    #[test]
    fn counter_direction_without_a_big_enough_move_is_a_reverse_not_a_stop_loss() {
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let reason = evaluate_exit(&pos, -1, 0.80, 99.9, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::Reverse));
    }

    #[test]
    fn bars_open_at_the_decay_limit_times_out() {
        let mut pos = Position::open(1, 100.0, 1.0, 0.7);
        pos.bars_open = 8;
        let reason = evaluate_exit(&pos, 1, 0.9, 100.0, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::Timeout));
    }

    #[test]
    fn a_strong_favorable_move_with_high_confidence_takes_profit() {
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let reason = evaluate_exit(&pos, 1, 0.85, 100.5, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::TakeProfit));
    }

    #[test]
    fn low_confidence_with_no_other_trigger_drops() {
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let reason = evaluate_exit(&pos, 1, 0.30, 100.05, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::Drop));
    }

    #[test]
    fn a_quiet_tick_holds_with_no_exit() {
        let pos = Position::open(1, 100.0, 1.0, 0.7);
        let reason = evaluate_exit(&pos, 1, 0.50, 100.05, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, None);
    }

    #[test]
    fn stop_loss_takes_priority_over_timeout_when_both_would_fire() {
        let mut pos = Position::open(1, 100.0, 1.0, 0.7);
        pos.bars_open = 10;
        let reason = evaluate_exit(&pos, -1, 0.80, 98.0, 0.42, 0.60, &exit_cfg());
        assert_eq!(reason, Some(ExitReason::StopLoss));
    }
}
