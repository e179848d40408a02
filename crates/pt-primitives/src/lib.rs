//! Derived scalars computed from OHLCV windows and the trade log:
//! velocity, exponential decay, compression, opportunity density, and
//! self-trust calibration. Each submodule owns exactly one state file.

pub mod compression;
pub mod decay;
pub mod opportunity;
pub mod primitive_state;
pub mod self_trust;
pub mod velocity;

pub use compression::{
    update_time_in_compression, CompressionState, DEFAULT_COMPRESSION_THRESHOLD,
};
pub use decay::{age_seconds, compute_decays, exp_decay, DecayReading};
pub use opportunity::{
    ewma, ewma_timeaware, update_opportunity_state, OpportunityMetrics, OpportunityState,
};
pub use primitive_state::{PrimitiveEntry, PrimitiveState};
pub use self_trust::{
    compute_self_trust_from_trade_log, extract_close_samples, metrics as self_trust_metrics,
    read_new_trade_lines, update_state_with_samples, CalibrationSample, SelfTrustMetrics,
    SelfTrustState,
};
pub use velocity::{compute_velocities, compute_velocity};
