//! OHLCV ingestion: provider stickiness, cooldown/backoff, priority
//! fallback, stale-bar trimming, and a last-known-good cache.

pub mod cooldown;
pub mod fetch;
pub mod provider;
pub mod stickiness;

pub use cooldown::{CooldownEntry, ProviderCooldownState};
pub use fetch::{fetch_ohlcv, CachedBars, OhlcvCacheState};
pub use provider::{BinanceProvider, FetchError, OhlcvProvider, OkxProvider};
pub use stickiness::{sticky_key, ProviderStickinessState, StickyEntry};
