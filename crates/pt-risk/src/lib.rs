mod bands;
mod drawdown;
mod evaluate;
mod pf;
mod pf_reports;

pub use bands::{bounded_mult, select_band, BANDS, MULT_MAX, MULT_MIN};
pub use drawdown::{compute_drawdown, read_equity_curve};
pub use evaluate::{evaluate, run, RiskEvaluation};
pub use pf::{profit_factor, read_recent_closes};
pub use pf_reports::{update_pf_reports, PfReport, PF_LOCAL_WINDOW};
