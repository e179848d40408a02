mod engine;
mod entry;
mod exit;
mod pnl;
mod state;

pub use engine::{on_tick, TickInputs, TickOutcome};
pub use entry::{effective_entry_min_conf, is_entry_eligible, try_open};
pub use exit::{evaluate_exit, ExitReason};
pub use pnl::{accounting_cost_pct, net_pnl, raw_pnl_pct};
pub use state::Position;
