use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct CooldownEntry {
    pub cooldown_until_ts: Option<DateTime<Utc>>,
    pub last_error: Option<String>,
    /// Consecutive-failure counter, reset to 0 by any success.
    pub count: u32,
}

/// `provider -> {cooldown_until_ts, last_error, count}`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderCooldownState {
    #[serde(flatten)]
    pub providers: BTreeMap<String, CooldownEntry>,
}

const HARD_CAP_SECONDS: i64 = 3600;

/// Consecutive-failure index -> seconds, per error class. `429`/`timeout`
/// (and anything unrecognized) ramp gently; `403` starts long, on the
/// assumption that a ban is not going to lift in five minutes.
fn backoff_steps(error_code: &str) -> [i64; 4] {
    match error_code {
        "403" => [1800, 3600, 3600, 3600],
        _ => [300, 600, 1800, 3600],
    }
}

fn cooldown_seconds_for(error_code: &str, consecutive_failures_before: u32) -> i64 {
    let steps = backoff_steps(error_code);
    let idx = (consecutive_failures_before as usize).min(steps.len() - 1);
    steps[idx].min(HARD_CAP_SECONDS)
}

impl ProviderCooldownState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }

    pub fn in_cooldown(&self, provider: &str, now: DateTime<Utc>) -> bool {
        self.providers
            .get(provider)
            .and_then(|e| e.cooldown_until_ts)
            .map(|until| now < until)
            .unwrap_or(false)
    }

    /// `bump = true` (the normal path) computes the duration from the
    /// provider's running consecutive-failure count and then increments
    /// it. `bump = false` forces the first-failure duration regardless of
    /// history, without touching the counter — used when the caller wants
    /// to apply a cooldown without it compounding prior failures.
    pub fn set_cooldown(
        &mut self,
        provider: &str,
        now: DateTime<Utc>,
        error_code: &str,
        bump: bool,
    ) {
        let entry = self.providers.entry(provider.to_string()).or_default();
        let count_before = if bump { entry.count } else { 0 };
        let secs = cooldown_seconds_for(error_code, count_before);
        entry.cooldown_until_ts = Some(now + Duration::seconds(secs));
        entry.last_error = Some(error_code.to_string());
        if bump {
            entry.count += 1;
        }
    }

    pub fn clear_cooldown(&mut self, provider: &str) {
        let entry = self.providers.entry(provider.to_string()).or_default();
        entry.count = 0;
        entry.cooldown_until_ts = None;
        entry.last_error = None;
    }
}
