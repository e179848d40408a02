use std::path::{Path, PathBuf};

use crate::mode::Mode;

/// Canonical on-disk layout under a reports root. Constructed once at
/// startup; every state-file path a component needs is a method here so
/// the layout lives in exactly one place.
#[derive(Clone, Debug)]
pub struct Paths {
    root: PathBuf,
    mode: Mode,
}

impl Paths {
    pub fn new(root: impl Into<PathBuf>, mode: Mode) -> Self {
        Self {
            root: root.into(),
            mode,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    fn at(&self, rel: &str) -> PathBuf {
        self.root.join(rel)
    }

    pub fn loop_health(&self) -> PathBuf {
        self.at("loop_health.json")
    }

    pub fn loop_health_mirror(&self) -> PathBuf {
        self.at("loop/loop_health.json")
    }

    pub fn heartbeat(&self) -> PathBuf {
        self.at("loop/heartbeat.json")
    }

    pub fn latest_snapshot(&self) -> PathBuf {
        self.at("latest_snapshot.json")
    }

    pub fn incidents(&self) -> PathBuf {
        self.at("incidents.jsonl")
    }

    pub fn primitive_state(&self) -> PathBuf {
        self.at("primitive_state.json")
    }

    pub fn opportunity_state(&self) -> PathBuf {
        self.at("opportunity_state.json")
    }

    pub fn compression_state(&self) -> PathBuf {
        self.at("compression_state.json")
    }

    pub fn self_trust_state(&self) -> PathBuf {
        self.at("self_trust_state.json")
    }

    pub fn provider_cooldown(&self) -> PathBuf {
        self.at("provider_cooldown.json")
    }

    pub fn provider_stickiness(&self) -> PathBuf {
        self.at("provider_stickiness.json")
    }

    pub fn ohlcv_provider_state(&self) -> PathBuf {
        self.at("ohlcv_provider_state.json")
    }

    pub fn risk_adapter_json(&self) -> PathBuf {
        self.at("risk_adapter.json")
    }

    pub fn risk_adapter_jsonl(&self) -> PathBuf {
        self.at("risk_adapter.jsonl")
    }

    /// DRY_RUN redirects the trade log and equity curve to dedicated paths
    /// so paper runs and dry-run rehearsals never interleave history.
    pub fn trades(&self) -> PathBuf {
        match self.mode {
            Mode::DryRun => self.at("trades_dry_run.jsonl"),
            _ => self.at("trades.jsonl"),
        }
    }

    pub fn equity_curve(&self) -> PathBuf {
        match self.mode {
            Mode::DryRun => self.at("equity_curve_dry_run.jsonl"),
            _ => self.at("equity_curve.jsonl"),
        }
    }

    pub fn pf_local(&self) -> PathBuf {
        self.at("pf_local.json")
    }

    pub fn pf_live(&self) -> PathBuf {
        self.at("pf_live.json")
    }
}
