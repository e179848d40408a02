use std::fs;

use anyhow::Result;
use chrono::{DateTime, Utc};

use pt_config::{AccountingConfig, EntryConfig, ExitConfig};
use pt_schemas::{CloseEvent, EquityPoint, OpenEvent, Paths, TradeEvent};

use crate::entry::{is_entry_eligible, try_open};
use crate::exit::{evaluate_exit, ExitReason};
use crate::pnl::net_pnl;
use crate::state::Position;

/// Everything the engine needs to know about the current tick, already
/// resolved by the council and risk adapter upstream.
pub struct TickInputs<'a> {
    pub symbol: &'a str,
    pub timeframe: &'a str,
    pub regime: &'a str,
    pub final_dir: i8,
    pub final_conf: f64,
    pub price: f64,
    pub risk_mult: f64,
    pub risk_band: Option<&'a str>,
    pub entry_min_conf: f64,
    pub exit_min_conf: f64,
    pub reverse_min_conf: f64,
    pub defensive_softening: f64,
    pub now: DateTime<Utc>,
}

/// Result of one tick's worth of state-machine evaluation.
pub struct TickOutcome {
    pub position: Option<Position>,
    pub opened: bool,
    pub closed: bool,
    pub flipped: bool,
    /// True iff a full open attempt would have been allowed this tick,
    /// independent of whether a position was already open. Drives
    /// opportunity-density eligibility upstream.
    pub eligible: bool,
    pub exit_reason: Option<ExitReason>,
}

fn last_equity(path: &std::path::Path) -> f64 {
    let Ok(contents) = fs::read_to_string(path) else {
        return 1.0;
    };
    contents
        .lines()
        .rev()
        .find_map(|line| serde_json::from_str::<EquityPoint>(line).ok())
        .map(|p| p.equity)
        .unwrap_or(1.0)
}

fn append_open(paths: &Paths, now: DateTime<Utc>, pos: &Position, inputs: &TickInputs) -> Result<()> {
    let ev = TradeEvent::Open(OpenEvent {
        ts: now,
        symbol: inputs.symbol.to_string(),
        timeframe: inputs.timeframe.to_string(),
        dir: pos.dir,
        entry_px: pos.entry_px,
        risk_mult: pos.risk_mult,
        regime: Some(inputs.regime.to_string()),
        risk_band: inputs.risk_band.map(|b| b.to_string()),
        confidence: Some(pos.entry_conf),
    });
    pt_io::atomic_append_jsonl(&paths.trades(), &ev)
}

fn append_close(
    paths: &Paths,
    now: DateTime<Utc>,
    pos: &Position,
    exit_px: f64,
    reason: ExitReason,
    final_conf: f64,
    inputs: &TickInputs,
    accounting: &AccountingConfig,
    scratch_threshold_bps: f64,
) -> Result<f64> {
    let (net_pct, is_scratch) = net_pnl(pos.entry_px, exit_px, pos.dir, accounting, scratch_threshold_bps);
    let ev = TradeEvent::Close(CloseEvent {
        ts: now,
        pct: net_pct,
        fee_bps: accounting.taker_fee_bps * 2.0,
        slip_bps: accounting.slip_bps,
        entry_px: Some(pos.entry_px),
        exit_px: Some(exit_px),
        exit_reason: Some(reason.as_str().to_string()),
        exit_conf: Some(final_conf),
        regime: Some(inputs.regime.to_string()),
        risk_band: inputs.risk_band.map(|b| b.to_string()),
        risk_mult: Some(pos.risk_mult),
        is_scratch: Some(is_scratch),
    });
    pt_io::atomic_append_jsonl(&paths.trades(), &ev)?;

    let prev_equity = last_equity(&paths.equity_curve());
    let next_equity = prev_equity * (1.0 + net_pct / 100.0);
    pt_io::atomic_append_jsonl(
        &paths.equity_curve(),
        &EquityPoint { ts: now, equity: next_equity },
    )?;
    Ok(net_pct)
}

/// Advances the state machine by one tick. `entry_cfg`/`exit_cfg`/
/// `accounting` are the ambient config sections; `paths` locates
/// `trades.jsonl`/`equity_curve.jsonl`.
pub fn on_tick(
    position: Option<Position>,
    inputs: &TickInputs,
    entry_cfg: &EntryConfig,
    exit_cfg: &ExitConfig,
    accounting: &AccountingConfig,
    paths: &Paths,
) -> Result<TickOutcome> {
    let eligible = is_entry_eligible(
        entry_cfg,
        inputs.regime,
        inputs.final_dir,
        inputs.final_conf,
        inputs.entry_min_conf,
        inputs.risk_mult,
        inputs.defensive_softening,
    );

    let Some(pos) = position else {
        let opened = try_open(
            None,
            entry_cfg,
            inputs.regime,
            inputs.final_dir,
            inputs.final_conf,
            inputs.price,
            inputs.entry_min_conf,
            inputs.risk_mult,
            inputs.defensive_softening,
        );
        if let Some(new_pos) = &opened {
            append_open(paths, inputs.now, new_pos, inputs)?;
        }
        return Ok(TickOutcome {
            position: opened.clone(),
            opened: opened.is_some(),
            closed: false,
            flipped: false,
            eligible,
            exit_reason: None,
        });
    };

    let reason = evaluate_exit(
        &pos,
        inputs.final_dir,
        inputs.final_conf,
        inputs.price,
        inputs.exit_min_conf,
        inputs.reverse_min_conf,
        exit_cfg,
    );

    let Some(reason) = reason else {
        let mut held = pos;
        held.bars_open += 1;
        return Ok(TickOutcome {
            position: Some(held),
            opened: false,
            closed: false,
            flipped: false,
            eligible,
            exit_reason: None,
        });
    };

    append_close(
        paths,
        inputs.now,
        &pos,
        inputs.price,
        reason,
        inputs.final_conf,
        inputs,
        accounting,
        exit_cfg.scratch_threshold_bps,
    )?;

    if reason == ExitReason::Reverse && entry_cfg.allow_opens {
        let flipped = try_open(
            None,
            entry_cfg,
            inputs.regime,
            inputs.final_dir,
            inputs.final_conf,
            inputs.price,
            inputs.entry_min_conf,
            inputs.risk_mult,
            inputs.defensive_softening,
        );
        if let Some(new_pos) = &flipped {
            append_open(paths, inputs.now, new_pos, inputs)?;
            return Ok(TickOutcome {
                position: flipped,
                opened: true,
                closed: true,
                flipped: true,
                eligible,
                exit_reason: Some(reason),
            });
        }
    }

    Ok(TickOutcome {
        position: None,
        opened: false,
        closed: true,
        flipped: false,
        eligible,
        exit_reason: Some(reason),
    })
}
