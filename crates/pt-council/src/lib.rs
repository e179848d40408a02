//! Bucket scoring, PAPER-mode regime masking, and council aggregation —
//! the confidence engine that turns a signal vector into a directional,
//! confidence-scored trading decision plus the gate thresholds to act on it.

pub mod aggregate;
pub mod buckets;
pub mod decide;
pub mod mask;

pub use aggregate::{council_aggregate, CouncilFinal};
pub use buckets::{
    bucket_outputs, compute_bucket_confidences, compute_bucket_directions, compute_bucket_scores,
    BucketOutput,
};
pub use decide::{decide, CouncilDecision, Gates};
pub use mask::apply_bucket_mask;
