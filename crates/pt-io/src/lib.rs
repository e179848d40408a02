//! The atomic I/O substrate every state file and log in this workspace is
//! built on: write-then-rename for whole-file JSON, append-flush-fsync for
//! JSONL. There is exactly one writer per state file (see the ownership
//! rule in the data model), so no in-process locking is needed here.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::{Map, Value};

/// Writes `obj` to `path` by first writing `path.tmp`, fsyncing it, then
/// renaming over `path`. The temp file is removed on any error so a failed
/// write never leaves stray `.tmp` litter or a partially-written target.
pub fn atomic_write_json<T: Serialize>(path: &Path, obj: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir for {}", path.display()))?;
    }
    let tmp_path = tmp_path_for(path);
    let result = write_tmp_and_rename(path, &tmp_path, obj);
    if result.is_err() {
        let _ = fs::remove_file(&tmp_path);
    }
    result
}

fn write_tmp_and_rename<T: Serialize>(path: &Path, tmp_path: &Path, obj: &T) -> Result<()> {
    let mut file =
        File::create(tmp_path).with_context(|| format!("create temp file {}", tmp_path.display()))?;
    serde_json::to_writer_pretty(&mut file, obj).context("serialize json")?;
    file.flush().context("flush temp file")?;
    file.sync_all().context("fsync temp file")?;
    fs::rename(tmp_path, path)
        .with_context(|| format!("rename {} -> {}", tmp_path.display(), path.display()))?;
    Ok(())
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut os = path.as_os_str().to_owned();
    os.push(".tmp");
    os.into()
}

/// Appends one JSON object followed by `\n` to `path`, flushing and
/// fsyncing before returning. Parent directories are created on demand.
pub fn atomic_append_jsonl<T: Serialize>(path: &Path, obj: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create parent dir for {}", path.display()))?;
    }
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("open {} for append", path.display()))?;
    let mut line = serde_json::to_string(obj).context("serialize jsonl line")?;
    line.push('\n');
    file.write_all(line.as_bytes())
        .with_context(|| format!("append to {}", path.display()))?;
    file.flush().context("flush jsonl append")?;
    file.sync_all().context("fsync jsonl append")?;
    Ok(())
}

/// Reads a JSON file if present; returns `Ok(None)` if it does not exist so
/// callers can distinguish "no state yet" from a parse error.
pub fn read_json_opt<T: serde::de::DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    match fs::read_to_string(path) {
        Ok(s) => {
            let v = serde_json::from_str(&s)
                .with_context(|| format!("parse json {}", path.display()))?;
            Ok(Some(v))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e).with_context(|| format!("read {}", path.display())),
    }
}

/// Recursively sorts object keys so two semantically-equal values produce
/// byte-identical serialized output, regardless of insertion order.
pub fn sort_keys(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut keys: Vec<_> = map.keys().cloned().collect();
            keys.sort();
            let mut new = Map::new();
            for k in keys {
                new.insert(k.clone(), sort_keys(&map[&k]));
            }
            Value::Object(new)
        }
        Value::Array(arr) => Value::Array(arr.iter().map(sort_keys).collect()),
        other => other.clone(),
    }
}

/// Canonical (sorted-key, compact) JSON text for a value — used for
/// hashing (config fingerprints) and for byte-equal round-trip tests.
pub fn canonical_json<T: Serialize>(obj: &T) -> Result<String> {
    let v = serde_json::to_value(obj).context("to_value for canonicalization")?;
    let sorted = sort_keys(&v);
    serde_json::to_string(&sorted).context("serialize canonical json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::fs;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Sample {
        a: i32,
        b: String,
    }

    #[test]
    fn atomic_write_then_read_round_trips_byte_equal() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        let obj = Sample {
            a: 1,
            b: "hello".into(),
        };
        atomic_write_json(&path, &obj).unwrap();
        let first_bytes = fs::read(&path).unwrap();
        atomic_write_json(&path, &obj).unwrap();
        let second_bytes = fs::read(&path).unwrap();
        assert_eq!(first_bytes, second_bytes);

        let read_back: Sample = read_json_opt(&path).unwrap().unwrap();
        assert_eq!(read_back, obj);
    }

    #[test]
    fn atomic_write_leaves_no_tmp_file_behind() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.json");
        atomic_write_json(&path, &Sample { a: 1, b: "x".into() }).unwrap();
        assert!(!dir.path().join("state.json.tmp").exists());
    }

    #[test]
    fn read_json_opt_is_none_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing.json");
        let read: Option<Sample> = read_json_opt(&path).unwrap();
        assert!(read.is_none());
    }

    #[test]
    fn append_jsonl_writes_one_line_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("log.jsonl");
        atomic_append_jsonl(&path, &Sample { a: 1, b: "x".into() }).unwrap();
        atomic_append_jsonl(&path, &Sample { a: 2, b: "y".into() }).unwrap();
        let contents = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn canonical_json_sorts_keys_regardless_of_struct_field_order() {
        let v1 = serde_json::json!({"b": 1, "a": 2});
        let v2 = serde_json::json!({"a": 2, "b": 1});
        assert_eq!(
            canonical_json(&v1).unwrap(),
            canonical_json(&v2).unwrap()
        );
    }
}
