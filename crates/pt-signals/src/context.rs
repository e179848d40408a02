use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use pt_schemas::Bar;

/// Everything a signal's compute function is allowed to see. Oldest-first
/// bar window plus whatever derived primitive readings the caller already
/// has lying around (velocity, decay, compression) so signals don't
/// recompute them.
pub struct SignalContext<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub bars: &'a [Bar],
    pub primitives: &'a BTreeMap<String, f64>,
    pub now: DateTime<Utc>,
}

impl<'a> SignalContext<'a> {
    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }

    pub fn primitive(&self, key: &str) -> Option<f64> {
        self.primitives.get(key).copied()
    }
}
