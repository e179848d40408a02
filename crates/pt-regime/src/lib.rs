//! Market regime classification: the bar-based primary classifier that
//! feeds the council, and a secondary z-score-only classifier kept for
//! interop with the older three-label taxonomy.

pub mod history;
pub mod interop;
pub mod primary;

pub use interop::{InteropClassifier, InteropReading, InteropRegime};
pub use primary::{PrimaryClassifier, Regime, RegimeReading, DEFAULT_PANIC_THRESHOLD};
