use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::primitive_state::PrimitiveState;

/// `v_per_s = (v_cur - v_prev) / (ts_cur - ts_prev)`. Null if either
/// endpoint is missing or time did not move forward.
pub fn compute_velocity(
    prev: Option<(DateTime<Utc>, f64)>,
    cur_ts: DateTime<Utc>,
    cur_val: f64,
) -> Option<f64> {
    let (prev_ts, prev_val) = prev?;
    let dt = (cur_ts - prev_ts).num_milliseconds() as f64 / 1000.0;
    if dt <= 0.0 {
        return None;
    }
    Some((cur_val - prev_val) / dt)
}

/// Computes `{key}_per_s` for every key present in `current`, then
/// unconditionally seeds `state` with the new `{ts, value}` so the next
/// tick always has a previous observation to diff against.
pub fn compute_velocities(
    state: &mut PrimitiveState,
    ts: DateTime<Utc>,
    current: &BTreeMap<String, f64>,
) -> BTreeMap<String, Option<f64>> {
    let mut out = BTreeMap::new();
    for (key, &cur_val) in current {
        let prev = state.get(key);
        let v = compute_velocity(prev, ts, cur_val);
        out.insert(format!("{key}_per_s"), v);
        state.update(key, ts, cur_val);
    }
    out
}
