use std::collections::BTreeMap;

use pt_config::BUCKETS;
use pt_signals::SignalEntry;

#[derive(Clone, Copy, Debug, Default, serde::Serialize)]
pub struct BucketOutput {
    pub dir: i8,
    pub conf: f64,
    pub score: f64,
}

/// `score_i = Σ weight_j * signal_j` over every signal whose registry entry
/// lists bucket `i`. All seven canonical buckets are always present in the
/// result, reserved ones included, even when nothing votes into them.
pub fn compute_bucket_scores(registry: &[SignalEntry], signal_vector: &[f64]) -> BTreeMap<String, f64> {
    let mut scores: BTreeMap<String, f64> = BUCKETS.iter().map(|b| (b.to_string(), 0.0)).collect();
    for (entry, &value) in registry.iter().zip(signal_vector.iter()) {
        for bucket in entry.buckets {
            if let Some(slot) = scores.get_mut(*bucket) {
                *slot += entry.weight * value;
            }
        }
    }
    scores
}

/// `dir = sign(score)` with a dead-zone: scores whose magnitude is below
/// `dead_zone` read as neutral.
pub fn compute_bucket_directions(scores: &BTreeMap<String, f64>, dead_zone: f64) -> BTreeMap<String, i8> {
    scores
        .iter()
        .map(|(k, &v)| {
            let dir = if v.abs() < dead_zone {
                0
            } else if v > 0.0 {
                1
            } else {
                -1
            };
            (k.clone(), dir)
        })
        .collect()
}

pub fn compute_bucket_confidences(scores: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    scores.iter().map(|(k, &v)| (k.clone(), v.abs().min(1.0))).collect()
}

pub fn bucket_outputs(
    scores: &BTreeMap<String, f64>,
    dirs: &BTreeMap<String, i8>,
    confs: &BTreeMap<String, f64>,
) -> BTreeMap<String, BucketOutput> {
    BUCKETS
        .iter()
        .map(|&b| {
            (
                b.to_string(),
                BucketOutput {
                    dir: *dirs.get(b).unwrap_or(&0),
                    conf: *confs.get(b).unwrap_or(&0.0),
                    score: *scores.get(b).unwrap_or(&0.0),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pt_signals::build_registry;

    #[test]
    fn all_seven_buckets_are_always_present() {
        let registry = build_registry();
        let vector = vec![0.0; registry.len()];
        let scores = compute_bucket_scores(&registry, &vector);
        assert_eq!(scores.len(), BUCKETS.len());
    }

    #[test]
    fn a_score_below_the_dead_zone_reads_as_neutral() {
        let mut scores = BTreeMap::new();
        scores.insert("momentum".to_string(), 0.02);
        let dirs = compute_bucket_directions(&scores, 0.05);
        assert_eq!(dirs["momentum"], 0);
    }

    #[test]
    fn confidence_is_the_clamped_absolute_score() {
        let mut scores = BTreeMap::new();
        scores.insert("momentum".to_string(), -2.5);
        let confs = compute_bucket_confidences(&scores);
        assert_eq!(confs["momentum"], 1.0);
    }
}
