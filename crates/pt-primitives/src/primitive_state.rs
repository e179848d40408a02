use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One key's last observed `{ts, value}`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct PrimitiveEntry {
    pub ts: DateTime<Utc>,
    pub value: f64,
}

/// Per-key rolling `{ts, value}` store, the seed for velocity and decay.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PrimitiveState {
    #[serde(flatten)]
    pub entries: BTreeMap<String, PrimitiveEntry>,
}

impl PrimitiveState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }

    pub fn get(&self, key: &str) -> Option<(DateTime<Utc>, f64)> {
        self.entries.get(key).map(|e| (e.ts, e.value))
    }

    /// Updates unconditionally whenever `value` is provided, regardless of
    /// whether it moved — this is what seeds a non-null velocity next tick.
    pub fn update(&mut self, key: &str, ts: DateTime<Utc>, value: f64) {
        self.entries
            .insert(key.to_string(), PrimitiveEntry { ts, value });
    }
}
