use std::collections::BTreeMap;

use serde::Serialize;

use crate::context::SignalContext;
use crate::error::SignalError;
use crate::normalize::{normalize, NormMethod, DEFAULT_Z_TANH};
use crate::signals;

pub type ComputeFn = fn(&SignalContext) -> Result<f64, SignalError>;

#[derive(Clone, Copy)]
pub struct SignalEntry {
    pub name: &'static str,
    pub category: &'static str,
    pub buckets: &'static [&'static str],
    pub weight: f64,
    pub norm: NormMethod,
    pub compute: ComputeFn,
}

#[derive(Clone, Debug, Serialize)]
pub struct RawSignal {
    pub value: f64,
    pub source: String,
    pub category: String,
    pub weight: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Compile-time signal catalogue. Referencing an unknown signal name
/// elsewhere in configuration is a construction-time panic, not a silently
/// skipped signal — there is no runtime string dispatch here.
pub fn build_registry() -> Vec<SignalEntry> {
    vec![
        SignalEntry {
            name: "momentum_roc",
            category: "momentum",
            buckets: &["momentum"],
            weight: 1.0,
            norm: DEFAULT_Z_TANH,
            compute: signals::momentum_roc,
        },
        SignalEntry {
            name: "momentum_velocity",
            category: "momentum",
            buckets: &["momentum"],
            weight: 1.0,
            norm: DEFAULT_Z_TANH,
            compute: signals::momentum_velocity,
        },
        SignalEntry {
            name: "meanrev_bb_zscore",
            category: "meanrev",
            buckets: &["meanrev"],
            weight: 1.0,
            norm: NormMethod::Bounded {
                min: -3.0,
                max: 3.0,
                center: 0.0,
            },
            compute: signals::meanrev_bb_zscore,
        },
        SignalEntry {
            name: "meanrev_rsi",
            category: "meanrev",
            buckets: &["meanrev"],
            weight: 1.0,
            norm: NormMethod::Bounded {
                min: 0.0,
                max: 100.0,
                center: 50.0,
            },
            compute: signals::meanrev_rsi,
        },
        SignalEntry {
            name: "flow_volume_zscore",
            category: "flow",
            buckets: &["flow"],
            weight: 1.0,
            norm: DEFAULT_Z_TANH,
            compute: signals::flow_volume_zscore,
        },
        SignalEntry {
            name: "flow_obv_slope",
            category: "flow",
            buckets: &["flow"],
            weight: 1.0,
            norm: DEFAULT_Z_TANH,
            compute: signals::flow_obv_slope,
        },
        SignalEntry {
            name: "positioning_atr_percent",
            category: "positioning",
            buckets: &["positioning"],
            weight: 1.0,
            norm: NormMethod::Bounded {
                min: 0.0,
                max: 0.05,
                center: 0.015,
            },
            compute: signals::positioning_atr_percent,
        },
        SignalEntry {
            name: "positioning_bb_width",
            category: "positioning",
            buckets: &["positioning"],
            weight: 1.0,
            norm: NormMethod::Bounded {
                min: 0.0,
                max: 0.10,
                center: 0.03,
            },
            compute: signals::positioning_bb_width,
        },
        SignalEntry {
            name: "timing_session_phase",
            category: "timing",
            buckets: &["timing"],
            weight: 1.0,
            norm: NormMethod::Bounded {
                min: -1.0,
                max: 1.0,
                center: 0.0,
            },
            compute: signals::timing_session_phase,
        },
        SignalEntry {
            name: "timing_compression_age",
            category: "timing",
            buckets: &["timing"],
            weight: 1.0,
            norm: DEFAULT_Z_TANH,
            compute: signals::timing_compression_age,
        },
    ]
}

pub struct SignalVector {
    pub signal_vector: Vec<f64>,
    pub raw_registry: BTreeMap<String, RawSignal>,
}

/// Evaluates every registered signal against `ctx`. A signal whose compute
/// function errors contributes `0.0` to the vector and records the error
/// in the raw registry rather than aborting the whole pass.
pub fn build_signal_vector(registry: &[SignalEntry], ctx: &SignalContext) -> SignalVector {
    let mut signal_vector = Vec::with_capacity(registry.len());
    let mut raw_registry = BTreeMap::new();

    for entry in registry {
        match (entry.compute)(ctx) {
            Ok(raw) => {
                let normalized = normalize(raw, entry.norm);
                signal_vector.push(normalized);
                raw_registry.insert(
                    entry.name.to_string(),
                    RawSignal {
                        value: raw,
                        source: entry.name.to_string(),
                        category: entry.category.to_string(),
                        weight: entry.weight,
                        error: None,
                    },
                );
            }
            Err(e) => {
                signal_vector.push(0.0);
                raw_registry.insert(
                    entry.name.to_string(),
                    RawSignal {
                        value: 0.0,
                        source: entry.name.to_string(),
                        category: entry.category.to_string(),
                        weight: entry.weight,
                        error: Some(e.to_string()),
                    },
                );
            }
        }
    }

    SignalVector {
        signal_vector,
        raw_registry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use pt_schemas::Bar;

    fn bars(n: usize) -> Vec<Bar> {
        (0..n)
            .map(|i| Bar {
                ts: Utc.timestamp_opt(1_700_000_000 + i as i64 * 60, 0).unwrap(),
                open: 100.0 + i as f64,
                high: 101.0 + i as f64,
                low: 99.0 + i as f64,
                close: 100.0 + i as f64,
                volume: 50.0 + i as f64,
            })
            .collect()
    }

    #[test]
    fn vector_length_matches_registry_length() {
        let registry = build_registry();
        let b = bars(30);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        let result = build_signal_vector(&registry, &ctx);
        assert_eq!(result.signal_vector.len(), registry.len());
        assert_eq!(result.raw_registry.len(), registry.len());
    }

    #[test]
    fn every_entry_is_finite_and_in_unit_range() {
        let registry = build_registry();
        let b = bars(5); // too few bars for most signals, forces the error path
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        let result = build_signal_vector(&registry, &ctx);
        for v in &result.signal_vector {
            assert!(v.is_finite());
            assert!((-1.0..=1.0).contains(v));
        }
    }

    #[test]
    fn insufficient_bars_records_an_error_and_zero_value() {
        let registry = build_registry();
        let b = bars(3);
        let primitives = BTreeMap::new();
        let ctx = SignalContext {
            symbol: "ETHUSDT",
            timeframe: "1m",
            bars: &b,
            primitives: &primitives,
            now: Utc::now(),
        };
        let result = build_signal_vector(&registry, &ctx);
        let roc = &result.raw_registry["momentum_roc"];
        assert_eq!(roc.value, 0.0);
        assert!(roc.error.is_some());
    }
}
