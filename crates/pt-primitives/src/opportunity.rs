use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize)]
pub struct RegimeCounters {
    pub ticks: u64,
    pub eligible: u64,
    pub ticks_ewma: f64,
    pub eligible_ewma: f64,
    pub last_ts: Option<DateTime<Utc>>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OpportunityState {
    pub global: RegimeCounters,
    #[serde(default)]
    pub by_regime: BTreeMap<String, RegimeCounters>,
    #[serde(default)]
    pub density_ewma: f64,
    #[serde(default)]
    pub by_regime_density: BTreeMap<String, f64>,
    pub last_update_ts: Option<DateTime<Utc>>,
}

impl OpportunityState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }
}

pub fn ewma(prev: f64, x: f64, alpha: f64) -> f64 {
    alpha * x + (1.0 - alpha) * prev
}

/// `alpha = clamp(1 - exp(-dt_minutes / half_life_minutes), 0.01, 0.5)`,
/// falling back to a fixed 0.05 when `dt_minutes <= 0` (first observation,
/// or a clock that did not advance).
pub fn ewma_timeaware(prev: f64, x: f64, dt_minutes: f64, half_life_minutes: f64) -> f64 {
    let alpha = if dt_minutes > 0.0 && half_life_minutes > 0.0 {
        (1.0 - (-dt_minutes / half_life_minutes).exp()).clamp(0.01, 0.5)
    } else {
        0.05
    };
    ewma(prev, x, alpha)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OpportunityMetrics {
    pub eligible: bool,
    pub density_current: f64,
    pub global_density_ewma: f64,
}

/// Updates both the per-regime and global tick/eligible counters and their
/// time-aware density EWMAs for this tick's `(regime, is_eligible)`
/// observation.
pub fn update_opportunity_state(
    state: &mut OpportunityState,
    ts: DateTime<Utc>,
    regime: &str,
    is_eligible: bool,
    half_life_minutes: f64,
) -> OpportunityMetrics {
    let dt_minutes = state
        .last_update_ts
        .map(|prev| (ts - prev).num_milliseconds() as f64 / 60_000.0)
        .unwrap_or(0.0);

    let eligible_x = if is_eligible { 1.0 } else { 0.0 };

    for counters in [
        Some(&mut state.global),
        Some(
            state
                .by_regime
                .entry(regime.to_string())
                .or_insert_with(RegimeCounters::default),
        ),
    ]
    .into_iter()
    .flatten()
    {
        counters.ticks += 1;
        if is_eligible {
            counters.eligible += 1;
        }
        counters.ticks_ewma = ewma_timeaware(counters.ticks_ewma, 1.0, dt_minutes, half_life_minutes);
        counters.eligible_ewma =
            ewma_timeaware(counters.eligible_ewma, eligible_x, dt_minutes, half_life_minutes);
        counters.last_ts = Some(ts);
    }

    state.density_ewma = ewma_timeaware(state.density_ewma, eligible_x, dt_minutes, half_life_minutes);
    let regime_density = state.by_regime_density.entry(regime.to_string()).or_insert(0.0);
    *regime_density = ewma_timeaware(*regime_density, eligible_x, dt_minutes, half_life_minutes);
    let density_current = *regime_density;

    state.last_update_ts = Some(ts);

    OpportunityMetrics {
        eligible: is_eligible,
        density_current,
        global_density_ewma: state.density_ewma,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn eligible_true_increments_both_counters() {
        let mut state = OpportunityState::default();
        update_opportunity_state(&mut state, Utc::now(), "chop", true, 120.0);
        assert_eq!(state.global.ticks, 1);
        assert_eq!(state.global.eligible, 1);
        assert_eq!(state.by_regime["chop"].ticks, 1);
    }

    #[test]
    fn eligible_never_exceeds_ticks() {
        let mut state = OpportunityState::default();
        let mut t = Utc::now();
        for eligible in [true, false, true, false, false] {
            update_opportunity_state(&mut state, t, "trend_up", eligible, 120.0);
            t = t + Duration::seconds(60);
        }
        assert!(state.global.eligible <= state.global.ticks);
    }

    #[test]
    fn density_values_stay_in_unit_interval() {
        let mut state = OpportunityState::default();
        let mut t = Utc::now();
        for i in 0..20 {
            update_opportunity_state(&mut state, t, "trend_up", i % 2 == 0, 120.0);
            t = t + Duration::minutes(5);
        }
        assert!(state.density_ewma >= 0.0 && state.density_ewma <= 1.0);
        assert!(state.by_regime_density["trend_up"] >= 0.0);
        assert!(state.by_regime_density["trend_up"] <= 1.0);
    }

    #[test]
    fn timeaware_alpha_falls_back_to_fixed_value_on_zero_dt() {
        // Same ewma step applied with dt=0 should match the dt<=0 branch
        // (fixed alpha of 0.05), not a division blow-up.
        let v = ewma_timeaware(0.5, 1.0, 0.0, 120.0);
        assert_eq!(v, ewma(0.5, 1.0, 0.05));
    }
}
