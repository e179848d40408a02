use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pt_schemas::Paths;

/// Written after every tick (success or failure) so an external watchdog
/// can tell the loop is alive without tailing logs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LoopHealth {
    pub ts: DateTime<Utc>,
    pub tick_count: u64,
    pub consecutive_failures: u32,
    pub status: String,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub issues: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

impl LoopHealth {
    pub fn ok(now: DateTime<Utc>, tick_count: u64, issues: Vec<String>) -> Self {
        Self {
            ts: now,
            tick_count,
            consecutive_failures: 0,
            status: "ok".to_string(),
            issues,
            last_error: None,
        }
    }

    pub fn failing(now: DateTime<Utc>, tick_count: u64, consecutive_failures: u32, last_error: impl Into<String>) -> Self {
        Self {
            ts: now,
            tick_count,
            consecutive_failures,
            status: "failing".to_string(),
            issues: Vec::new(),
            last_error: Some(last_error.into()),
        }
    }
}

/// Writes `loop_health.json` and its `loop/` mirror. Both writes are
/// atomic (write-temp-then-rename) but independent: a mirror-write
/// failure doesn't roll back the primary.
pub fn write_loop_health(paths: &Paths, health: &LoopHealth) -> Result<()> {
    pt_io::atomic_write_json(&paths.loop_health(), health)?;
    if let Err(err) = pt_io::atomic_write_json(&paths.loop_health_mirror(), health) {
        tracing::warn!(error = %err, "failed to write loop_health mirror");
    }
    Ok(())
}
