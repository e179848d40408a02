use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// The five active council buckets, plus the two reserved zero-weight
/// buckets that exist for forward compatibility (sentiment, on-chain flow
/// data sources are not wired into the signal registry yet).
pub const BUCKETS: [&str; 7] = [
    "momentum",
    "meanrev",
    "flow",
    "positioning",
    "timing",
    "sentiment",
    "onchain_flow",
];

pub const ACTIVE_BUCKETS: [&str; 5] = ["momentum", "meanrev", "flow", "positioning", "timing"];

fn default_weight_profile(profile: &str) -> BTreeMap<String, f64> {
    let pairs: &[(&str, f64)] = match profile {
        "trend" => &[
            ("momentum", 0.40),
            ("meanrev", 0.05),
            ("flow", 0.20),
            ("positioning", 0.25),
            ("timing", 0.10),
            ("sentiment", 0.0),
            ("onchain_flow", 0.0),
        ],
        "high_vol" => &[
            ("momentum", 0.25),
            ("meanrev", 0.20),
            ("flow", 0.15),
            ("positioning", 0.15),
            ("timing", 0.25),
            ("sentiment", 0.0),
            ("onchain_flow", 0.0),
        ],
        // "chop" and anything else fall back to the chop-shaped profile.
        _ => &[
            ("momentum", 0.10),
            ("meanrev", 0.35),
            ("flow", 0.20),
            ("positioning", 0.10),
            ("timing", 0.25),
            ("sentiment", 0.0),
            ("onchain_flow", 0.0),
        ],
    };
    pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
}

/// Council weights keyed by weight-profile name (`"trend"`, `"chop"`,
/// `"high_vol"`) — `panic_down` maps onto `"trend"` and `trend_up`/
/// `trend_down` both map onto `"trend"` when looking these up; everything
/// else that isn't `high_vol` maps onto `"chop"`. See `pt-council` for the
/// regime-label-to-profile-name mapping.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CouncilWeights {
    #[serde(default)]
    pub profiles: BTreeMap<String, BTreeMap<String, f64>>,
}

impl Default for CouncilWeights {
    fn default() -> Self {
        let mut profiles = BTreeMap::new();
        for p in ["trend", "chop", "high_vol"] {
            profiles.insert(p.to_string(), default_weight_profile(p));
        }
        Self { profiles }
    }
}

impl CouncilWeights {
    pub fn profile(&self, name: &str) -> BTreeMap<String, f64> {
        self.profiles
            .get(name)
            .cloned()
            .unwrap_or_else(|| default_weight_profile(name))
    }
}

/// PAPER-only bucket masks, keyed by the six regime labels. `None` means
/// every bucket may vote (used for `high_vol`, where every signal matters).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RegimeBucketMask {
    #[serde(default)]
    pub masks: BTreeMap<String, Option<Vec<String>>>,
}

impl Default for RegimeBucketMask {
    fn default() -> Self {
        let mut masks: BTreeMap<String, Option<Vec<String>>> = BTreeMap::new();
        let v = |xs: &[&str]| Some(xs.iter().map(|s| s.to_string()).collect());
        masks.insert("trend_up".into(), v(&["momentum", "positioning", "flow"]));
        masks.insert("trend_down".into(), v(&["momentum", "positioning", "flow"]));
        masks.insert("panic_down".into(), v(&["momentum", "positioning"]));
        masks.insert("high_vol".into(), None);
        masks.insert("chop".into(), v(&["meanrev", "timing", "flow"]));
        masks.insert("unknown".into(), v(&["meanrev", "timing"]));
        Self { masks }
    }
}

impl RegimeBucketMask {
    pub fn for_regime(&self, regime: &str) -> Option<Vec<String>> {
        self.masks.get(regime).cloned().unwrap_or(None)
    }
}

/// Per-regime-profile entry/exit/reverse confidence gates.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GatesConfig {
    #[serde(default)]
    pub entry_min_conf: BTreeMap<String, f64>,
    #[serde(default = "default_exit_min_conf")]
    pub exit_min_conf: f64,
    #[serde(default = "default_reverse_min_conf")]
    pub reverse_min_conf: f64,
    #[serde(default = "default_neutral_zone")]
    pub neutral_zone: f64,
    #[serde(default = "default_bucket_dead_zone")]
    pub bucket_dead_zone: f64,
    #[serde(default = "default_defensive_softening")]
    pub defensive_softening: f64,
}

fn default_exit_min_conf() -> f64 {
    0.42
}
fn default_reverse_min_conf() -> f64 {
    0.60
}
fn default_neutral_zone() -> f64 {
    0.30
}
fn default_bucket_dead_zone() -> f64 {
    0.05
}
fn default_defensive_softening() -> f64 {
    0.07
}

impl Default for GatesConfig {
    fn default() -> Self {
        let mut entry_min_conf = BTreeMap::new();
        entry_min_conf.insert("trend".to_string(), 0.58);
        entry_min_conf.insert("chop".to_string(), 0.58);
        entry_min_conf.insert("high_vol".to_string(), 0.62);
        Self {
            entry_min_conf,
            exit_min_conf: default_exit_min_conf(),
            reverse_min_conf: default_reverse_min_conf(),
            neutral_zone: default_neutral_zone(),
            bucket_dead_zone: default_bucket_dead_zone(),
            defensive_softening: default_defensive_softening(),
        }
    }
}

impl GatesConfig {
    pub fn entry_min_conf_for(&self, profile: &str) -> f64 {
        self.entry_min_conf.get(profile).copied().unwrap_or(0.58)
    }
}

/// Fee/slippage accounting applied on every close.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct AccountingConfig {
    #[serde(default = "default_taker_fee_bps")]
    pub taker_fee_bps: f64,
    #[serde(default = "default_slip_bps")]
    pub slip_bps: f64,
}

fn default_taker_fee_bps() -> f64 {
    6.0
}
fn default_slip_bps() -> f64 {
    2.0
}

impl Default for AccountingConfig {
    fn default() -> Self {
        Self {
            taker_fee_bps: default_taker_fee_bps(),
            slip_bps: default_slip_bps(),
        }
    }
}

/// Entry gating: a global kill switch plus a per-regime allow-list.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EntryConfig {
    #[serde(default = "default_allow_opens")]
    pub allow_opens: bool,
    #[serde(default = "default_blocked_regimes")]
    pub blocked_regimes: Vec<String>,
}

fn default_allow_opens() -> bool {
    true
}

fn default_blocked_regimes() -> Vec<String> {
    vec!["chop".into(), "trend_up".into(), "unknown".into()]
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            allow_opens: default_allow_opens(),
            blocked_regimes: default_blocked_regimes(),
        }
    }
}

impl EntryConfig {
    pub fn regime_allows_entry(&self, regime: &str) -> bool {
        !self.blocked_regimes.iter().any(|r| r == regime)
    }
}

/// Exit-condition tuning: timeout, scratch classification, stop-loss and
/// take-profit thresholds.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct ExitConfig {
    #[serde(default = "default_decay_bars")]
    pub decay_bars: u32,
    #[serde(default = "default_scratch_threshold_bps")]
    pub scratch_threshold_bps: f64,
    #[serde(default = "default_stop_loss_price_frac")]
    pub stop_loss_price_frac: f64,
    #[serde(default = "default_take_profit_conf_min")]
    pub take_profit_conf_min: f64,
    #[serde(default = "default_take_profit_price_rmult_min")]
    pub take_profit_price_rmult_min: f64,
}

fn default_decay_bars() -> u32 {
    8
}
fn default_scratch_threshold_bps() -> f64 {
    5.0
}
fn default_stop_loss_price_frac() -> f64 {
    0.015
}
fn default_take_profit_conf_min() -> f64 {
    0.80
}
fn default_take_profit_price_rmult_min() -> f64 {
    0.0015
}

impl Default for ExitConfig {
    fn default() -> Self {
        Self {
            decay_bars: default_decay_bars(),
            scratch_threshold_bps: default_scratch_threshold_bps(),
            stop_loss_price_frac: default_stop_loss_price_frac(),
            take_profit_conf_min: default_take_profit_conf_min(),
            take_profit_price_rmult_min: default_take_profit_price_rmult_min(),
        }
    }
}

/// Per-regime density floors (`pt-primitives`' opportunity density module
/// exposes how the current density compares to these but does not itself
/// enforce them).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DensityFloors {
    #[serde(default)]
    pub floors: BTreeMap<String, f64>,
}

impl Default for DensityFloors {
    fn default() -> Self {
        let mut floors = BTreeMap::new();
        floors.insert("trend_up".to_string(), 0.08);
        floors.insert("trend_down".to_string(), 0.08);
        floors.insert("chop".to_string(), 0.12);
        floors.insert("high_vol".to_string(), 0.10);
        floors.insert("panic_down".to_string(), 0.08);
        floors.insert("unknown".to_string(), 0.10);
        Self { floors }
    }
}

impl DensityFloors {
    pub fn floor_for(&self, regime: &str) -> f64 {
        self.floors.get(regime).copied().unwrap_or(0.10)
    }
}

/// Fixed priority order of OHLCV providers to try.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProvidersConfig {
    #[serde(default = "default_provider_priority")]
    pub priority: Vec<String>,
}

fn default_provider_priority() -> Vec<String> {
    vec!["binance_us".into(), "binance".into(), "okx".into()]
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            priority: default_provider_priority(),
        }
    }
}

/// Opportunity-density EWMA half-life, in minutes.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct DensityConfig {
    #[serde(default = "default_half_life_minutes")]
    pub half_life_minutes: f64,
}

fn default_half_life_minutes() -> f64 {
    120.0
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            half_life_minutes: default_half_life_minutes(),
        }
    }
}

/// The fully-resolved engine configuration: every field has a baked-in
/// default, so a missing or partial YAML document still produces a
/// complete, usable value.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub council_weights: CouncilWeights,
    #[serde(default)]
    pub regime_bucket_mask: RegimeBucketMask,
    #[serde(default)]
    pub gates: GatesConfig,
    #[serde(default)]
    pub accounting: AccountingConfig,
    #[serde(default)]
    pub entry: EntryConfig,
    #[serde(default)]
    pub exit: ExitConfig,
    #[serde(default)]
    pub density_floors: DensityFloors,
    #[serde(default)]
    pub density: DensityConfig,
    #[serde(default)]
    pub providers: ProvidersConfig,
}
