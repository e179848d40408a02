use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::pf::{profit_factor, read_recent_closes};

/// Trailing-trade window for `pf_local.json`; `pf_live.json` covers the
/// full trade log.
pub const PF_LOCAL_WINDOW: usize = 150;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PfReport {
    pub pf: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<usize>,
    pub count: usize,
}

/// Refreshes `pf_local.json` (trailing `PF_LOCAL_WINDOW` closes) and
/// `pf_live.json` (the whole trade log) from `trades.jsonl`. A PF with no
/// loss-side data, or no closes at all, reports as `0.0` rather than null
/// — these files feed dashboards that expect a number.
pub fn update_pf_reports(trades_path: &Path, pf_local_path: &Path, pf_live_path: &Path) -> Result<()> {
    let all = read_recent_closes(trades_path, usize::MAX)?;
    let (pf_live, live_count) = profit_factor(&all);
    pt_io::atomic_write_json(
        pf_live_path,
        &PfReport {
            pf: pf_live.unwrap_or(0.0),
            window: None,
            count: live_count,
        },
    )?;

    let local = read_recent_closes(trades_path, PF_LOCAL_WINDOW)?;
    let (pf_local, local_count) = profit_factor(&local);
    pt_io::atomic_write_json(
        pf_local_path,
        &PfReport {
            pf: pf_local.unwrap_or(0.0),
            window: Some(PF_LOCAL_WINDOW),
            count: local_count,
        },
    )?;

    Ok(())
}
