use anyhow::Result;

use pt_schemas::{Paths, Snapshot};

/// Writes the fully-populated per-tick snapshot to `latest_snapshot.json`,
/// overwriting the previous tick's. This is a point-in-time view, not a
/// log — history lives in the trade log and equity curve, not here.
pub fn write_latest_snapshot(paths: &Paths, snapshot: &Snapshot) -> Result<()> {
    pt_io::atomic_write_json(&paths.latest_snapshot(), snapshot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_schemas::{new_snapshot, Mode};

    #[test]
    fn write_latest_snapshot_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path(), Mode::Paper);
        let now = chrono::Utc::now();

        let first = new_snapshot(now, "ETHUSDT", "1h", Mode::Paper);
        write_latest_snapshot(&paths, &first).unwrap();

        let mut second = new_snapshot(now, "BTCUSDT", "1h", Mode::Paper);
        second.set_path("decision.final.dir", serde_json::Value::from(1));
        write_latest_snapshot(&paths, &second).unwrap();

        let contents = std::fs::read_to_string(paths.latest_snapshot()).unwrap();
        let back: Snapshot = serde_json::from_str(&contents).unwrap();
        assert_eq!(back.symbol, "BTCUSDT");
    }
}
