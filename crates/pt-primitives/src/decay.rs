use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

use crate::primitive_state::PrimitiveState;

/// `value * 0.5^(age_s / half_life_s)`. Null if `half_life_s <= 0`.
pub fn exp_decay(value: f64, age_s: f64, half_life_s: f64) -> Option<f64> {
    if half_life_s <= 0.0 || age_s < 0.0 {
        return None;
    }
    Some(value * 0.5_f64.powf(age_s / half_life_s))
}

pub fn age_seconds(prev_ts: DateTime<Utc>, cur_ts: DateTime<Utc>) -> Option<f64> {
    let dt = (cur_ts - prev_ts).num_milliseconds() as f64 / 1000.0;
    if dt < 0.0 {
        None
    } else {
        Some(dt)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DecayReading {
    pub age_s: Option<f64>,
    pub half_life_s: f64,
    pub decayed: Option<f64>,
    pub prev: Option<f64>,
    pub refreshed: bool,
}

/// For every key in `half_lives`, reports the decayed view of the last
/// confirmed value (from `state`, not from `current`) plus whether this
/// tick actually refreshed that value. Decay itself does not depend on
/// whether `current` has a fresh observation for the key.
pub fn compute_decays(
    state: &mut PrimitiveState,
    ts: DateTime<Utc>,
    current: &BTreeMap<String, f64>,
    half_lives: &BTreeMap<String, f64>,
) -> BTreeMap<String, DecayReading> {
    let mut out = BTreeMap::new();
    for (key, &half_life_s) in half_lives {
        let prev = state.get(key);
        let (age_s, decayed, prev_val) = match prev {
            Some((prev_ts, prev_val)) => {
                let age = age_seconds(prev_ts, ts);
                let decayed = age.and_then(|a| exp_decay(prev_val, a, half_life_s));
                (age, decayed, Some(prev_val))
            }
            None => (None, None, None),
        };
        let refreshed = current.contains_key(key);
        out.insert(
            key.clone(),
            DecayReading {
                age_s,
                half_life_s,
                decayed,
                prev: prev_val,
                refreshed,
            },
        );
        if let Some(&cur_val) = current.get(key) {
            state.update(key, ts, cur_val);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn value_halves_after_one_half_life() {
        let v = exp_decay(1.0, 60.0, 60.0).unwrap();
        assert!((v - 0.5).abs() < 1e-9);
    }

    #[test]
    fn zero_half_life_is_invalid() {
        assert_eq!(exp_decay(1.0, 10.0, 0.0), None);
    }

    #[test]
    fn negative_age_is_invalid() {
        assert_eq!(age_seconds(Utc::now() + Duration::seconds(5), Utc::now()), None);
    }

    #[test]
    fn first_tick_has_no_prior_value_to_decay() {
        let mut state = PrimitiveState::default();
        let mut half_lives = BTreeMap::new();
        half_lives.insert("pci".to_string(), 300.0);
        let out = compute_decays(&mut state, Utc::now(), &BTreeMap::new(), &half_lives);
        assert_eq!(out["pci"].decayed, None);
        assert!(!out["pci"].refreshed);
    }

    #[test]
    fn decay_is_reported_even_without_a_fresh_observation() {
        let mut state = PrimitiveState::default();
        let mut half_lives = BTreeMap::new();
        half_lives.insert("pci".to_string(), 60.0);
        let mut seed = BTreeMap::new();
        seed.insert("pci".to_string(), 1.0);
        let t0 = Utc::now();
        compute_decays(&mut state, t0, &seed, &half_lives);

        let t1 = t0 + Duration::seconds(60);
        let out = compute_decays(&mut state, t1, &BTreeMap::new(), &half_lives);
        assert!(!out["pci"].refreshed);
        assert!((out["pci"].decayed.unwrap() - 0.5).abs() < 1e-9);
    }
}
