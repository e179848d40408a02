use std::fs;
use std::path::Path;

use anyhow::Result;
use pt_schemas::EquityPoint;

pub fn read_equity_curve(path: &Path) -> Result<Vec<EquityPoint>> {
    let Ok(contents) = fs::read_to_string(path) else {
        return Ok(Vec::new());
    };
    let mut points = Vec::new();
    for line in contents.lines() {
        if line.trim().is_empty() {
            continue;
        }
        if let Ok(point) = serde_json::from_str::<EquityPoint>(line) {
            points.push(point);
        }
    }
    Ok(points)
}

/// `(last_equity, peak_equity, drawdown)`, drawdown = `max(0, 1 - last/peak)`.
/// `None` when the curve is empty.
pub fn compute_drawdown(points: &[EquityPoint]) -> Option<(f64, f64, f64)> {
    let last = points.last()?.equity;
    let peak = points.iter().map(|p| p.equity).fold(f64::NEG_INFINITY, f64::max);
    let drawdown = if peak <= 0.0 { 0.0 } else { (1.0 - last / peak).max(0.0) };
    Some((last, peak, drawdown))
}
