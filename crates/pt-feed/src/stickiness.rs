use std::collections::BTreeMap;
use std::path::Path;

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StickyEntry {
    pub source: String,
    pub ts: DateTime<Utc>,
}

/// `"SYMBOL:TIMEFRAME" -> {source, ts}`. The selected source survives
/// restarts so rolling indicators built on it do not wobble on a silent
/// provider switch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProviderStickinessState {
    #[serde(flatten)]
    pub entries: BTreeMap<String, StickyEntry>,
}

pub fn sticky_key(symbol: &str, timeframe: &str) -> String {
    format!("{}:{}", symbol.to_ascii_uppercase(), timeframe)
}

impl ProviderStickinessState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }

    pub fn get_preferred_source(&self, symbol: &str, timeframe: &str) -> Option<&str> {
        self.entries
            .get(&sticky_key(symbol, timeframe))
            .map(|e| e.source.as_str())
    }

    pub fn set_preferred_source(&mut self, symbol: &str, timeframe: &str, source: &str, ts: DateTime<Utc>) {
        self.entries.insert(
            sticky_key(symbol, timeframe),
            StickyEntry {
                source: source.to_string(),
                ts,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_upper_cases_symbol_but_not_timeframe() {
        assert_eq!(sticky_key("ethusdt", "1h"), "ETHUSDT:1h");
    }

    #[test]
    fn preferred_source_round_trips_through_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("provider_stickiness.json");
        let mut state = ProviderStickinessState::default();
        state.set_preferred_source("ETHUSDT", "1h", "binance", Utc::now());
        state.save(&path).unwrap();

        let reloaded = ProviderStickinessState::load(&path).unwrap();
        assert_eq!(reloaded.get_preferred_source("ETHUSDT", "1h"), Some("binance"));
    }

    #[test]
    fn unknown_symbol_timeframe_has_no_preference() {
        let state = ProviderStickinessState::default();
        assert_eq!(state.get_preferred_source("BTCUSDT", "1h"), None);
    }
}
