use std::fs;
use std::path::Path;

use anyhow::Result;
use pt_schemas::TradeEvent;

/// Reads up to `max_trades` close events off the tail of the trade log,
/// newest first.
pub fn read_recent_closes(path: &Path, max_trades: usize) -> Result<Vec<f64>> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Ok(Vec::new());
    };
    let mut pcts = Vec::new();
    for line in contents.lines().rev() {
        if line.trim().is_empty() {
            continue;
        }
        let Ok(TradeEvent::Close(close)) = serde_json::from_str::<TradeEvent>(line) else {
            continue;
        };
        pcts.push(close.pct);
        if pcts.len() >= max_trades {
            break;
        }
    }
    Ok(pcts)
}

/// `(profit_factor, sample_count)`. `None` profit factor when there is
/// nothing to compute from (no closes, or neither wins nor losses).
pub fn profit_factor(pcts: &[f64]) -> (Option<f64>, usize) {
    let win_sum: f64 = pcts.iter().filter(|&&p| p > 0.0).sum();
    let loss_sum: f64 = pcts.iter().filter(|&&p| p < 0.0).map(|p| p.abs()).sum();

    let pf = if loss_sum > 0.0 {
        Some(win_sum / loss_sum)
    } else if win_sum > 0.0 {
        Some(f64::INFINITY)
    } else {
        None
    };
    (pf, pcts.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn profit_factor_is_win_sum_over_loss_sum() {
        let (pf, n) = profit_factor(&[0.02, -0.01, 0.01]);
        assert_eq!(n, 3);
        assert!((pf.unwrap() - 3.0).abs() < 1e-9);
    }

    #[test]
    fn all_wins_with_no_losses_is_infinite() {
        let (pf, _) = profit_factor(&[0.02, 0.01]);
        assert_eq!(pf, Some(f64::INFINITY));
    }

    #[test]
    fn no_trades_has_no_profit_factor() {
        let (pf, n) = profit_factor(&[]);
        assert_eq!(pf, None);
        assert_eq!(n, 0);
    }

    #[test]
    fn missing_file_yields_no_closes() {
        let pcts = read_recent_closes(Path::new("/nonexistent/trades.jsonl"), 50).unwrap();
        assert!(pcts.is_empty());
    }
}
