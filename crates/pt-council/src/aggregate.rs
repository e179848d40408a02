use std::collections::BTreeMap;

use pt_config::BUCKETS;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct CouncilFinal {
    pub dir: i8,
    pub conf: f64,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// `final_score = Σ w_i · dir_i · conf_i` over all seven buckets (the two
/// zero-weight reserved ones included, for forward compatibility). Scores
/// inside `neutral_zone` collapse to a flat `dir = 0`.
pub fn council_aggregate(
    weights: &BTreeMap<String, f64>,
    bucket_dirs: &BTreeMap<String, i8>,
    bucket_confs: &BTreeMap<String, f64>,
    neutral_zone: f64,
) -> CouncilFinal {
    let final_score: f64 = BUCKETS
        .iter()
        .map(|&b| {
            let w = weights.get(b).copied().unwrap_or(0.0);
            let dir = bucket_dirs.get(b).copied().unwrap_or(0) as f64;
            let conf = bucket_confs.get(b).copied().unwrap_or(0.0);
            w * dir * conf
        })
        .sum();

    if final_score.abs() < neutral_zone {
        CouncilFinal { dir: 0, conf: round2(final_score.abs()) }
    } else {
        let dir = if final_score > 0.0 { 1 } else { -1 };
        CouncilFinal {
            dir,
            conf: round2(final_score.abs().min(1.0)),
        }
    }
}
