use std::collections::BTreeMap;

use pt_config::EngineConfig;
use pt_signals::SignalEntry;

use crate::aggregate::{council_aggregate, CouncilFinal};
use crate::buckets::{bucket_outputs, compute_bucket_confidences, compute_bucket_directions, compute_bucket_scores, BucketOutput};
use crate::mask::apply_bucket_mask;

#[derive(Clone, Debug, serde::Serialize)]
pub struct Gates {
    pub entry_min_conf: f64,
    pub exit_min_conf: f64,
    pub reverse_min_conf: f64,
}

#[derive(Clone, Debug, serde::Serialize)]
pub struct CouncilDecision {
    pub buckets: BTreeMap<String, BucketOutput>,
    pub final_: CouncilFinal,
    pub gates: Gates,
}

/// `panic_down` rides the `trend_down` weight profile; `trend_up`/
/// `trend_down` both ride `"trend"`; everything else (`chop`, `unknown`)
/// rides `"chop"`. `high_vol` is the one regime that keeps its own name.
fn weight_profile_for_regime(regime: &str) -> &'static str {
    match regime {
        "trend_up" | "trend_down" | "panic_down" => "trend",
        "high_vol" => "high_vol",
        _ => "chop",
    }
}

/// Pure function from a signal pass to a trading decision: bucket scores,
/// PAPER-mode masking, council aggregation, and the gate thresholds the
/// caller needs to act on it.
pub fn decide(
    config: &EngineConfig,
    registry: &[SignalEntry],
    signal_vector: &[f64],
    regime: &str,
    is_paper_mode: bool,
) -> CouncilDecision {
    let scores = compute_bucket_scores(registry, signal_vector);
    let dirs = compute_bucket_directions(&scores, config.gates.bucket_dead_zone);
    let confs = compute_bucket_confidences(&scores);

    let profile = weight_profile_for_regime(regime);
    let base_weights = config.council_weights.profile(profile);
    let masked_weights = apply_bucket_mask(&base_weights, regime, is_paper_mode, &dirs, &config.regime_bucket_mask);

    let final_ = council_aggregate(&masked_weights, &dirs, &confs, config.gates.neutral_zone);

    CouncilDecision {
        buckets: bucket_outputs(&scores, &dirs, &confs),
        final_,
        gates: Gates {
            entry_min_conf: config.gates.entry_min_conf_for(profile),
            exit_min_conf: config.gates.exit_min_conf,
            reverse_min_conf: config.gates.reverse_min_conf,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_signals::build_registry;

    #[test]
    fn weight_profile_mapping_matches_the_council_aggregation_rules() {
        assert_eq!(weight_profile_for_regime("trend_up"), "trend");
        assert_eq!(weight_profile_for_regime("trend_down"), "trend");
        assert_eq!(weight_profile_for_regime("panic_down"), "trend");
        assert_eq!(weight_profile_for_regime("high_vol"), "high_vol");
        assert_eq!(weight_profile_for_regime("chop"), "chop");
        assert_eq!(weight_profile_for_regime("unknown"), "chop");
    }

    #[test]
    fn decide_runs_end_to_end_with_an_all_zero_signal_vector() {
        let config = EngineConfig::default();
        let registry = build_registry();
        let vector = vec![0.0; registry.len()];
        let decision = decide(&config, &registry, &vector, "chop", true);
        assert_eq!(decision.final_.dir, 0);
        assert_eq!(decision.gates.entry_min_conf, 0.58);
    }

    #[test]
    fn high_vol_uses_its_own_entry_threshold() {
        let config = EngineConfig::default();
        let registry = build_registry();
        let vector = vec![0.0; registry.len()];
        let decision = decide(&config, &registry, &vector, "high_vol", true);
        assert_eq!(decision.gates.entry_min_conf, 0.62);
    }
}
