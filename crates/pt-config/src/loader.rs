use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::engine_config::EngineConfig;
use crate::merge::{deep_merge, sort_keys};

/// Result of loading and merging configuration: the typed, fully-defaulted
/// `EngineConfig` plus the canonical JSON text and its SHA-256 hash, so a
/// running process can report exactly which configuration it loaded.
#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: EngineConfig,
    pub canonical_json: String,
    pub config_hash: String,
}

/// Reads and deep-merges YAML documents in order (later files override
/// earlier ones field by field), canonicalizes the merged value, hashes
/// it, and deserializes into `EngineConfig`. Missing files are skipped
/// rather than treated as an error — the engine is fully usable from
/// defaults alone.
pub fn load_layered_config<P: AsRef<Path>>(paths: &[P]) -> Result<LoadedConfig> {
    let mut merged = Value::Object(Default::default());

    for p in paths {
        let p = p.as_ref();
        if !p.exists() {
            continue;
        }
        let s = fs::read_to_string(p).with_context(|| format!("read config: {}", p.display()))?;
        let yaml_val: serde_yaml::Value =
            serde_yaml::from_str(&s).with_context(|| format!("parse yaml: {}", p.display()))?;
        let json_val = serde_json::to_value(yaml_val).context("yaml->json conversion failed")?;
        deep_merge(&mut merged, json_val);
    }

    let canonical_value = sort_keys(&merged);
    let canonical_json =
        serde_json::to_string(&canonical_value).context("serialize canonical config json")?;

    let mut hasher = Sha256::new();
    hasher.update(canonical_json.as_bytes());
    let config_hash = hex::encode(hasher.finalize());

    let config: EngineConfig =
        serde_json::from_value(merged).context("deserialize merged config into EngineConfig")?;

    Ok(LoadedConfig {
        config,
        canonical_json,
        config_hash,
    })
}
