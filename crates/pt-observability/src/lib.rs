//! Best-effort observability surface: loop health, heartbeats, the
//! latest-tick snapshot, and the incident log. None of these writes are
//! allowed to take down the tick loop they're reporting on.

mod heartbeat;
mod incidents;
mod issues;
mod loop_health;
mod snapshot;

pub use heartbeat::{beat, is_alive, is_alive_within, Heartbeat};
pub use incidents::{create_incident, log_incident, Incident};
pub use issues::Issue;
pub use loop_health::{write_loop_health, LoopHealth};
pub use snapshot::write_latest_snapshot;
