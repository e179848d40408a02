use std::collections::BTreeMap;

use pt_config::RegimeBucketMask;

/// Regime-specific bucket masking, PAPER mode only. LIVE mode always votes
/// the full bucket set. In trend regimes the `flow` bucket additionally
/// drops out when its own direction disagrees with the trend's direction
/// — a direction filter, not a magnitude filter.
pub fn apply_bucket_mask(
    weights: &BTreeMap<String, f64>,
    regime: &str,
    is_paper_mode: bool,
    bucket_dirs: &BTreeMap<String, i8>,
    mask_config: &RegimeBucketMask,
) -> BTreeMap<String, f64> {
    if !is_paper_mode {
        return weights.clone();
    }

    let Some(mask) = mask_config.for_regime(regime) else {
        return weights.clone();
    };

    let mut active: Vec<String> = weights.keys().filter(|k| mask.contains(k)).cloned().collect();

    if matches!(regime, "trend_up" | "trend_down") {
        let trend_dir: i8 = if regime == "trend_up" { 1 } else { -1 };
        let flow_dir = bucket_dirs.get("flow").copied().unwrap_or(0);
        if active.iter().any(|b| b == "flow") && flow_dir != trend_dir {
            active.retain(|b| b != "flow");
        }
    }

    if active.is_empty() {
        return weights.clone();
    }

    let total: f64 = active.iter().map(|b| weights.get(b).copied().unwrap_or(0.0)).sum();
    if total > 0.0 {
        active
            .into_iter()
            .map(|b| {
                let w = weights.get(&b).copied().unwrap_or(0.0) / total;
                (b, w)
            })
            .collect()
    } else {
        active
            .into_iter()
            .map(|b| (b.clone(), weights.get(&b).copied().unwrap_or(0.0)))
            .collect()
    }
}
