use pt_primitives::compression::{atr_percent, bb_width_percent, sma, stdev};

use crate::context::SignalContext;
use crate::error::SignalError;

fn need(bars_have: usize, needed: usize) -> Result<(), SignalError> {
    if bars_have < needed {
        Err(SignalError::InsufficientBars {
            needed,
            have: bars_have,
        })
    } else {
        Ok(())
    }
}

/// Rate of change over a 10-bar lookback.
pub fn momentum_roc(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 11)?;
    let closes = ctx.closes();
    let last = *closes.last().unwrap();
    let prior = closes[closes.len() - 11];
    if prior == 0.0 {
        return Ok(0.0);
    }
    Ok((last - prior) / prior)
}

/// Close-price velocity, read from the shared primitives map rather than
/// recomputed here.
pub fn momentum_velocity(ctx: &SignalContext) -> Result<f64, SignalError> {
    ctx.primitive("close_per_s")
        .ok_or_else(|| SignalError::Generic("close_per_s primitive not available".to_string()))
}

/// Distance of the last close from its 20-bar mean, in standard deviations.
pub fn meanrev_bb_zscore(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 20)?;
    let closes = ctx.closes();
    let window = &closes[closes.len() - 20..];
    let mean = sma(window, 20).ok_or_else(|| SignalError::Generic("sma unavailable".to_string()))?;
    let sd = stdev(window);
    if sd == 0.0 {
        return Ok(0.0);
    }
    Ok((*closes.last().unwrap() - mean) / sd)
}

/// Classic 14-period RSI, in `[0, 100]`.
pub fn meanrev_rsi(ctx: &SignalContext) -> Result<f64, SignalError> {
    const PERIOD: usize = 14;
    need(ctx.bars.len(), PERIOD + 1)?;
    let closes = ctx.closes();
    let window = &closes[closes.len() - (PERIOD + 1)..];
    let mut gains = 0.0;
    let mut losses = 0.0;
    for pair in window.windows(2) {
        let delta = pair[1] - pair[0];
        if delta > 0.0 {
            gains += delta;
        } else {
            losses -= delta;
        }
    }
    if losses == 0.0 {
        return Ok(100.0);
    }
    let rs = (gains / PERIOD as f64) / (losses / PERIOD as f64);
    Ok(100.0 - (100.0 / (1.0 + rs)))
}

/// z-score of the last bar's volume against a 20-bar rolling mean.
pub fn flow_volume_zscore(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 20)?;
    let volumes: Vec<f64> = ctx.bars.iter().map(|b| b.volume).collect();
    let window = &volumes[volumes.len() - 20..];
    let mean = sma(window, 20).ok_or_else(|| SignalError::Generic("sma unavailable".to_string()))?;
    let sd = stdev(window);
    if sd == 0.0 {
        return Ok(0.0);
    }
    Ok((*volumes.last().unwrap() - mean) / sd)
}

/// On-balance-volume slope over the last 20 bars, scaled by average volume
/// so it's roughly dimensionless across symbols.
pub fn flow_obv_slope(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 20)?;
    let window = &ctx.bars[ctx.bars.len() - 20..];
    let mut obv = 0.0;
    let mut series = Vec::with_capacity(window.len());
    series.push(obv);
    for pair in window.windows(2) {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.close > prev.close {
            obv += cur.volume;
        } else if cur.close < prev.close {
            obv -= cur.volume;
        }
        series.push(obv);
    }
    let avg_volume: f64 = window.iter().map(|b| b.volume).sum::<f64>() / window.len() as f64;
    if avg_volume == 0.0 {
        return Ok(0.0);
    }
    let slope = (*series.last().unwrap() - series[0]) / series.len() as f64;
    Ok(slope / avg_volume)
}

/// ATR as a percentage of price, over 14 bars.
pub fn positioning_atr_percent(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 15)?;
    atr_percent(ctx.bars, 14).ok_or_else(|| SignalError::Generic("atr_percent unavailable".to_string()))
}

/// Bollinger band width as a percentage of price, over 20 bars.
pub fn positioning_bb_width(ctx: &SignalContext) -> Result<f64, SignalError> {
    need(ctx.bars.len(), 20)?;
    let closes = ctx.closes();
    bb_width_percent(&closes, 20, 2.0)
        .ok_or_else(|| SignalError::Generic("bb_width_percent unavailable".to_string()))
}

/// Minutes since UTC midnight, mapped onto a cosine so the signal is
/// continuous across the day boundary. A weak proxy for session timing
/// until a real session calendar is wired in.
pub fn timing_session_phase(ctx: &SignalContext) -> Result<f64, SignalError> {
    use chrono::Timelike;
    let minute_of_day = (ctx.now.hour() * 60 + ctx.now.minute()) as f64;
    let phase = minute_of_day / (24.0 * 60.0) * std::f64::consts::TAU;
    Ok(phase.cos())
}

/// Bars spent in the current compression regime, read from the shared
/// primitives map (populated by the compression primitive).
pub fn timing_compression_age(ctx: &SignalContext) -> Result<f64, SignalError> {
    ctx.primitive("time_in_compression_s")
        .ok_or_else(|| SignalError::Generic("time_in_compression_s primitive not available".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pt_schemas::Bar;
    use std::collections::BTreeMap;

    fn bars(closes: &[f64]) -> Vec<Bar> {
        closes
            .iter()
            .enumerate()
            .map(|(i, &c)| Bar {
                ts: Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                open: c,
                high: c + 1.0,
                low: c - 1.0,
                close: c,
                volume: 100.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn momentum_roc_needs_eleven_bars() {
        let b = bars(&[1.0; 5]);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        assert!(matches!(
            momentum_roc(&ctx),
            Err(SignalError::InsufficientBars { .. })
        ));
    }

    #[test]
    fn momentum_roc_computes_expected_change() {
        let mut closes = vec![100.0; 11];
        closes[10] = 110.0;
        let b = bars(&closes);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        let roc = momentum_roc(&ctx).unwrap();
        assert!((roc - 0.10).abs() < 1e-9);
    }

    #[test]
    fn rsi_of_monotonically_rising_closes_is_100() {
        let closes: Vec<f64> = (0..20).map(|i| 100.0 + i as f64).collect();
        let b = bars(&closes);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        assert_eq!(meanrev_rsi(&ctx).unwrap(), 100.0);
    }

    #[test]
    fn missing_velocity_primitive_is_a_generic_error() {
        let b = bars(&[1.0, 2.0]);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        assert!(matches!(
            momentum_velocity(&ctx),
            Err(SignalError::Generic(_))
        ));
    }

    #[test]
    fn session_phase_is_within_unit_range() {
        let b = bars(&[1.0]);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        let v = timing_session_phase(&ctx).unwrap();
        assert!((-1.0..=1.0).contains(&v));
    }
}
