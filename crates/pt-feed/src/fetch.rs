use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use pt_schemas::{timeframe_seconds, Bar, FetchMeta};

use crate::cooldown::ProviderCooldownState;
use crate::provider::OhlcvProvider;
use crate::stickiness::{sticky_key, ProviderStickinessState};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CachedBars {
    pub source: String,
    pub fetched_ts: DateTime<Utc>,
    pub bars: Vec<Bar>,
}

/// Last-known-good bars per `symbol:timeframe`, consulted only once every
/// live provider in the priority list has failed or is in cooldown.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct OhlcvCacheState {
    #[serde(flatten)]
    entries: BTreeMap<String, CachedBars>,
}

impl OhlcvCacheState {
    pub fn load(path: &Path) -> Result<Self> {
        Ok(pt_io::read_json_opt(path)?.unwrap_or_default())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        pt_io::atomic_write_json(path, self)
    }

    pub fn get(&self, symbol: &str, timeframe: &str) -> Option<&CachedBars> {
        self.entries.get(&sticky_key(symbol, timeframe))
    }

    pub fn set(&mut self, symbol: &str, timeframe: &str, cached: CachedBars) {
        self.entries.insert(sticky_key(symbol, timeframe), cached);
    }
}

/// Drops a last bar that has not closed yet (`ts + timeframe <= now` is the
/// condition for "closed"). Returns whether a bar was removed.
fn trim_incomplete_last_bar(bars: &mut Vec<Bar>, timeframe: &str, now: DateTime<Utc>) -> bool {
    let Some(secs) = timeframe_seconds(timeframe) else {
        return false;
    };
    match bars.last() {
        Some(last) if last.ts + chrono::Duration::seconds(secs) > now => {
            bars.pop();
            true
        }
        _ => false,
    }
}

fn ordered_candidates(
    priority: &[String],
    stickiness: &ProviderStickinessState,
    symbol: &str,
    timeframe: &str,
) -> Vec<String> {
    let mut order = Vec::with_capacity(priority.len());
    if let Some(preferred) = stickiness.get_preferred_source(symbol, timeframe) {
        if priority.iter().any(|p| p == preferred) {
            order.push(preferred.to_string());
        }
    }
    for p in priority {
        if !order.contains(p) {
            order.push(p.clone());
        }
    }
    order
}

/// Walks the provider priority list (sticky source first), skipping anyone
/// in cooldown, trying each until one succeeds. Falls back to the on-disk
/// cache if every candidate is unavailable or errors out.
pub async fn fetch_ohlcv(
    providers: &[Box<dyn OhlcvProvider>],
    priority: &[String],
    symbol: &str,
    timeframe: &str,
    limit: u32,
    stickiness: &mut ProviderStickinessState,
    cooldown: &mut ProviderCooldownState,
    cache: &mut OhlcvCacheState,
    now: DateTime<Utc>,
) -> Result<(Vec<Bar>, FetchMeta)> {
    let candidates = ordered_candidates(priority, stickiness, symbol, timeframe);

    for name in &candidates {
        if cooldown.in_cooldown(name, now) {
            continue;
        }
        let Some(provider) = providers.iter().find(|p| p.name() == name) else {
            continue;
        };
        match provider.fetch(symbol, timeframe, limit).await {
            Ok(mut bars) => {
                cooldown.clear_cooldown(name);
                stickiness.set_preferred_source(symbol, timeframe, name, now);
                let trimmed = trim_incomplete_last_bar(&mut bars, timeframe, now);
                let newest_bar_age_s = bars
                    .last()
                    .map(|b| (now - b.ts).num_seconds() as f64)
                    .unwrap_or(0.0);
                cache.set(
                    symbol,
                    timeframe,
                    CachedBars {
                        source: name.clone(),
                        fetched_ts: now,
                        bars: bars.clone(),
                    },
                );
                return Ok((
                    bars,
                    FetchMeta {
                        source: name.clone(),
                        newest_bar_age_s,
                        trimmed_incomplete_bar: trimmed,
                    },
                ));
            }
            Err(e) => {
                warn!(provider = %name, error = %e, "ohlcv fetch failed");
                cooldown.set_cooldown(name, now, e.error_code(), true);
            }
        }
    }

    if let Some(cached) = cache.get(symbol, timeframe) {
        let newest_bar_age_s = cached
            .bars
            .last()
            .map(|b| (now - b.ts).num_seconds() as f64)
            .unwrap_or(0.0);
        return Ok((
            cached.bars.clone(),
            FetchMeta {
                source: format!("cache:{}", cached.source),
                newest_bar_age_s,
                trimmed_incomplete_bar: false,
            },
        ));
    }

    Err(anyhow!(
        "no provider available for {symbol}:{timeframe} and no cached bars to fall back on"
    ))
}
