use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::mode::Mode;

/// Metadata nested under `snapshot.meta`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub tick_id: String,
    pub version: u32,
    #[serde(default)]
    pub notes: Vec<String>,
}

/// The per-tick record. Header fields are immutable once created; the
/// nested groups (`market`, `signals`, `primitives`, `regime`, `risk`,
/// `decision`, `execution`, `metrics`) are filled in as the tick
/// progresses and are represented as loosely-typed JSON so every
/// component can extend its own group without touching this crate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Snapshot {
    pub ts: DateTime<Utc>,
    pub symbol: String,
    pub timeframe: String,
    pub mode: Mode,
    #[serde(default)]
    pub market: Value,
    #[serde(default)]
    pub signals: Value,
    #[serde(default)]
    pub primitives: Value,
    #[serde(default)]
    pub regime: Value,
    #[serde(default)]
    pub risk: Value,
    #[serde(default)]
    pub decision: Value,
    #[serde(default)]
    pub execution: Value,
    #[serde(default)]
    pub metrics: Value,
    pub meta: SnapshotMeta,
}

const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// `tick_id` is a filesystem-safe unique identifier derived from the
/// header: `{ts_safe}_{symbol}_{timeframe}`, where `ts_safe` replaces
/// `:` and spaces with `-`/`_` so the id is usable as a path component.
pub fn tick_id(ts: DateTime<Utc>, symbol: &str, timeframe: &str) -> String {
    let ts_safe = ts
        .to_rfc3339()
        .replace(':', "-")
        .replace(' ', "_");
    format!("{ts_safe}_{symbol}_{timeframe}")
}

pub fn new_snapshot(ts: DateTime<Utc>, symbol: &str, timeframe: &str, mode: Mode) -> Snapshot {
    Snapshot {
        ts,
        symbol: symbol.to_string(),
        timeframe: timeframe.to_string(),
        mode,
        market: Value::Object(Map::new()),
        signals: Value::Object(Map::new()),
        primitives: Value::Object(Map::new()),
        regime: Value::Object(Map::new()),
        risk: Value::Object(Map::new()),
        decision: Value::Object(Map::new()),
        execution: Value::Object(Map::new()),
        metrics: Value::Object(Map::new()),
        meta: SnapshotMeta {
            tick_id: tick_id(ts, symbol, timeframe),
            version: SNAPSHOT_SCHEMA_VERSION,
            notes: Vec::new(),
        },
    }
}

impl Snapshot {
    /// Sets a dot-path (e.g. `"decision.final.dir"`) inside one of the
    /// nested groups, creating intermediate objects as needed. The first
    /// path segment selects the group; header fields are not reachable
    /// through this API by design (they're immutable once created).
    pub fn set_path(&mut self, dotted_path: &str, value: Value) {
        let mut parts = dotted_path.split('.');
        let Some(group) = parts.next() else { return };
        let root = self.group_mut(group);
        let rest: Vec<&str> = parts.collect();
        set_nested(root, &rest, value);
    }

    pub fn get_path(&self, dotted_path: &str) -> Option<&Value> {
        let mut parts = dotted_path.split('.');
        let group = parts.next()?;
        let root = self.group(group)?;
        let rest: Vec<&str> = parts.collect();
        get_nested(root, &rest)
    }

    fn group_mut(&mut self, name: &str) -> &mut Value {
        match name {
            "market" => &mut self.market,
            "signals" => &mut self.signals,
            "primitives" => &mut self.primitives,
            "regime" => &mut self.regime,
            "risk" => &mut self.risk,
            "decision" => &mut self.decision,
            "execution" => &mut self.execution,
            "metrics" => &mut self.metrics,
            other => panic!("unknown snapshot group: {other}"),
        }
    }

    fn group(&self, name: &str) -> Option<&Value> {
        match name {
            "market" => Some(&self.market),
            "signals" => Some(&self.signals),
            "primitives" => Some(&self.primitives),
            "regime" => Some(&self.regime),
            "risk" => Some(&self.risk),
            "decision" => Some(&self.decision),
            "execution" => Some(&self.execution),
            "metrics" => Some(&self.metrics),
            _ => None,
        }
    }
}

fn set_nested(root: &mut Value, path: &[&str], value: Value) {
    if path.is_empty() {
        *root = value;
        return;
    }
    if !root.is_object() {
        *root = Value::Object(Map::new());
    }
    let map = root.as_object_mut().expect("just coerced to object");
    if path.len() == 1 {
        map.insert(path[0].to_string(), value);
        return;
    }
    let entry = map
        .entry(path[0].to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_nested(entry, &path[1..], value);
}

fn get_nested<'a>(root: &'a Value, path: &[&str]) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(root);
    }
    let map = root.as_object()?;
    let next = map.get(path[0])?;
    get_nested(next, &path[1..])
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_ts() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 2, 3, 4, 5).unwrap()
    }

    #[test]
    fn tick_id_is_filesystem_safe() {
        let id = tick_id(sample_ts(), "ETHUSDT", "1h");
        assert!(!id.contains(':'));
        assert!(!id.contains(' '));
        assert!(id.ends_with("_ETHUSDT_1h"));
    }

    #[test]
    fn set_and_get_nested_path_round_trips() {
        let mut snap = new_snapshot(sample_ts(), "ETHUSDT", "1h", Mode::Paper);
        snap.set_path("decision.final.dir", Value::from(1));
        snap.set_path("decision.final.conf", Value::from(0.85));
        assert_eq!(snap.get_path("decision.final.dir"), Some(&Value::from(1)));
        assert_eq!(snap.get_path("decision.final.conf"), Some(&Value::from(0.85)));
    }

    #[test]
    fn get_missing_path_is_none() {
        let snap = new_snapshot(sample_ts(), "ETHUSDT", "1h", Mode::Paper);
        assert_eq!(snap.get_path("decision.final.dir"), None);
    }

    #[test]
    fn header_fields_survive_round_trip_serialization() {
        let snap = new_snapshot(sample_ts(), "ETHUSDT", "1h", Mode::Paper);
        let s = serde_json::to_string(&snap).unwrap();
        let back: Snapshot = serde_json::from_str(&s).unwrap();
        assert_eq!(back.symbol, "ETHUSDT");
        assert_eq!(back.timeframe, "1h");
        assert_eq!(back.meta.tick_id, snap.meta.tick_id);
    }
}
