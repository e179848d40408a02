//! Compile-time signal registry: a fixed catalogue of named, categorized
//! signal compute functions and their normalization methods, evaluated
//! against a `SignalContext` to produce a parallel `signal_vector` /
//! `raw_registry` pair.

pub mod context;
pub mod error;
pub mod normalize;
pub mod registry;
pub mod signals;

pub use context::SignalContext;
pub use error::SignalError;
pub use normalize::{normalize, NormMethod, DEFAULT_Z_TANH};
pub use registry::{build_registry, build_signal_vector, ComputeFn, RawSignal, SignalEntry, SignalVector};
