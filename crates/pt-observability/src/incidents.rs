use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pt_schemas::Paths;

/// One unhandled-error record appended to `incidents.jsonl`. Mirrors the
/// shape the loop writes when a tick raises instead of returning a result.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Incident {
    pub ts: DateTime<Utc>,
    pub level: String,
    #[serde(rename = "where")]
    pub where_: String,
    pub error_type: String,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeframe: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tick_id: Option<String>,
}

#[allow(clippy::too_many_arguments)]
pub fn create_incident(
    now: DateTime<Utc>,
    where_: impl Into<String>,
    error_type: impl Into<String>,
    error: impl Into<String>,
    context: Option<serde_json::Value>,
    symbol: Option<String>,
    timeframe: Option<String>,
    tick_id: Option<String>,
) -> Incident {
    Incident {
        ts: now,
        level: "error".to_string(),
        where_: where_.into(),
        error_type: error_type.into(),
        error: error.into(),
        context,
        symbol,
        timeframe,
        tick_id,
    }
}

/// Appends an incident to `incidents.jsonl`. Best-effort: a write failure
/// is logged and swallowed, never propagated, since incident logging must
/// not itself crash the loop it's reporting on.
pub fn log_incident(paths: &Paths, incident: &Incident) {
    if let Err(err) = pt_io::atomic_append_jsonl(&paths.incidents(), incident) {
        tracing::warn!(error = %err, "failed to append incident record");
    }
}
