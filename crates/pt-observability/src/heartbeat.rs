use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use pt_schemas::Paths;

const DEFAULT_MAX_AGE_SECS: i64 = 90;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Heartbeat {
    pub ts: DateTime<Utc>,
}

/// Writes the heartbeat file after each successful tick.
pub fn beat(paths: &Paths, now: DateTime<Utc>) -> Result<()> {
    pt_io::atomic_write_json(&paths.heartbeat(), &Heartbeat { ts: now })
}

/// True if the heartbeat's own timestamp is recent enough. Takes the
/// parsed body rather than the file's mtime since a paused process
/// leaves the mtime untouched but the body timestamp is what a replayed
/// or copied file would misreport.
pub fn is_alive(body_ts: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    is_alive_within(body_ts, now, DEFAULT_MAX_AGE_SECS)
}

pub fn is_alive_within(body_ts: DateTime<Utc>, now: DateTime<Utc>, max_age_secs: i64) -> bool {
    (now - body_ts).num_seconds() <= max_age_secs
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_schemas::Mode;

    #[test]
    fn beat_writes_a_readable_heartbeat_file() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path(), Mode::Paper);
        let now = Utc::now();
        beat(&paths, now).unwrap();
        let contents = std::fs::read_to_string(paths.heartbeat()).unwrap();
        let hb: Heartbeat = serde_json::from_str(&contents).unwrap();
        assert_eq!(hb.ts, now);
    }

    #[test]
    fn a_heartbeat_younger_than_the_ceiling_is_alive() {
        let now = Utc::now();
        let body_ts = now - chrono::Duration::seconds(30);
        assert!(is_alive(body_ts, now));
    }

    #[test]
    fn a_heartbeat_older_than_the_ceiling_is_not_alive() {
        let now = Utc::now();
        let body_ts = now - chrono::Duration::seconds(120);
        assert!(!is_alive(body_ts, now));
    }
}
