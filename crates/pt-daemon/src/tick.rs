use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde_json::json;

use pt_config::EngineConfig;
use pt_execution::{on_tick, Position, TickInputs};
use pt_feed::{fetch_ohlcv, OhlcvCacheState, OhlcvProvider, ProviderCooldownState, ProviderStickinessState};
use pt_observability::{beat, write_latest_snapshot, Issue};
use pt_primitives::compression::{atr_percent, bb_width_percent, compression_ratio, score_compression};
use pt_primitives::{
    compute_decays, compute_self_trust_from_trade_log, compute_velocities, update_opportunity_state,
    update_time_in_compression, CompressionState, OpportunityState, PrimitiveState,
    DEFAULT_COMPRESSION_THRESHOLD,
};
use pt_regime::{PrimaryClassifier, Regime};
use pt_risk::update_pf_reports;
use pt_schemas::{new_snapshot, Paths};
use pt_signals::{build_signal_vector, SignalContext, SignalEntry};

/// Bars requested per fetch: enough to seed the regime classifier's
/// 100-sample z-score history and the compression baseline windows below.
const BAR_FETCH_LIMIT: u32 = 200;

const ATR_PERIOD: usize = 14;
const BB_PERIOD: usize = 20;

/// Longer-window baselines the compression primitive compares its current
/// ATR%/BB-width% reading against — four times the classifier's own
/// short lookback.
const COMPRESSION_ATR_BASELINE_PERIOD: usize = ATR_PERIOD * 4;
const COMPRESSION_BB_BASELINE_PERIOD: usize = BB_PERIOD * 4;

/// Decay half-life shared by the two tracked scalars (`pci`, `confidence`).
const PRIMITIVE_HALF_LIFE_SECS: f64 = 15.0 * 60.0;

/// Long-lived, in-process state a tick needs across loop iterations but
/// that has no on-disk representation: the regime classifier's rolling
/// z-score histories and the open position, both explicitly reconstructed
/// fresh on restart rather than persisted.
pub struct EngineState {
    pub classifier: PrimaryClassifier,
    pub position: Option<Position>,
    pub last_bar_ts: Option<DateTime<Utc>>,
}

impl EngineState {
    pub fn new(panic_threshold: f64) -> Self {
        Self {
            classifier: PrimaryClassifier::new(panic_threshold),
            position: None,
            last_bar_ts: None,
        }
    }
}

/// What one loop iteration accomplished, for the scheduler's loop-health
/// bookkeeping.
pub struct TickReport {
    pub advanced: bool,
    pub issues: Vec<Issue>,
}

fn previous_primitive_values(state: &PrimitiveState) -> BTreeMap<String, f64> {
    state.entries.iter().map(|(k, e)| (k.clone(), e.value)).collect()
}

fn compression_score(bars: &[pt_schemas::Bar], closes: &[f64]) -> Option<f64> {
    let atrp_cur = atr_percent(bars, ATR_PERIOD)?;
    let atrp_baseline = atr_percent(bars, COMPRESSION_ATR_BASELINE_PERIOD)?;
    let bbw_cur = bb_width_percent(closes, BB_PERIOD, 2.0)?;
    let bbw_baseline = bb_width_percent(closes, COMPRESSION_BB_BASELINE_PERIOD, 2.0)?;
    let atr_ratio = compression_ratio(atrp_cur, atrp_baseline);
    let bb_ratio = compression_ratio(bbw_cur, bbw_baseline);
    Some(score_compression(atr_ratio, bb_ratio))
}

/// Runs one loop iteration: always fetches bars (C4+C5), but only runs the
/// rest of the pipeline (C6→C13) when the newest closed bar differs from
/// the last one this process advanced on.
#[allow(clippy::too_many_arguments)]
pub async fn run_tick(
    providers: &[Box<dyn OhlcvProvider>],
    registry: &[SignalEntry],
    config: &EngineConfig,
    paths: &Paths,
    symbol: &str,
    timeframe: &str,
    state: &mut EngineState,
    now: DateTime<Utc>,
    debug_signals: bool,
) -> Result<TickReport> {
    let mut issues: Vec<Issue> = Vec::new();
    let mut snapshot = new_snapshot(now, symbol, timeframe, paths.mode());

    // C4 + C5
    let mut stickiness = ProviderStickinessState::load(&paths.provider_stickiness())
        .context("load provider_stickiness.json")?;
    let mut cooldown =
        ProviderCooldownState::load(&paths.provider_cooldown()).context("load provider_cooldown.json")?;
    let mut cache =
        OhlcvCacheState::load(&paths.ohlcv_provider_state()).context("load ohlcv_provider_state.json")?;

    let (bars, fetch_meta) = fetch_ohlcv(
        providers,
        &config.providers.priority,
        symbol,
        timeframe,
        BAR_FETCH_LIMIT,
        &mut stickiness,
        &mut cooldown,
        &mut cache,
        now,
    )
    .await
    .context("fetch ohlcv bars")?;

    stickiness.save(&paths.provider_stickiness())?;
    cooldown.save(&paths.provider_cooldown())?;
    cache.save(&paths.ohlcv_provider_state())?;

    // A cache-sourced payload means every live provider failed this tick;
    // treat the feed as stale and refuse new opens rather than trade on it.
    let stale_feed = fetch_meta.source.starts_with("cache:");
    if stale_feed {
        issues.push(Issue::FeedStale);
    }

    snapshot.set_path("market.source", json!(fetch_meta.source));
    snapshot.set_path("market.newest_bar_age_s", json!(fetch_meta.newest_bar_age_s));
    snapshot.set_path(
        "market.trimmed_incomplete_bar",
        json!(fetch_meta.trimmed_incomplete_bar),
    );
    snapshot.set_path("market.bar_count", json!(bars.len()));

    let newest_bar_ts = bars.last().map(|b| b.ts);
    let advanced = match (newest_bar_ts, state.last_bar_ts) {
        (Some(ts), Some(prev)) => ts > prev,
        (Some(_), None) => true,
        (None, _) => false,
    };

    if !advanced {
        write_latest_snapshot(paths, &snapshot)?;
        beat(paths, now)?;
        return Ok(TickReport { advanced: false, issues });
    }
    state.last_bar_ts = newest_bar_ts;

    let mut primitive_state =
        PrimitiveState::load(&paths.primitive_state()).context("load primitive_state.json")?;
    let prior_primitives = previous_primitive_values(&primitive_state);

    // C6
    let closes: Vec<f64> = bars.iter().map(|b| b.close).collect();
    let signal_ctx = SignalContext {
        symbol,
        timeframe,
        bars: &bars,
        primitives: &prior_primitives,
        now,
    };
    let signal_pass = build_signal_vector(registry, &signal_ctx);
    if debug_signals {
        tracing::debug!(
            raw_registry = ?signal_pass.raw_registry,
            signal_vector = ?signal_pass.signal_vector,
            "signal pipeline"
        );
    }
    let all_signals_errored = signal_pass.raw_registry.values().all(|s| s.error.is_some());
    if all_signals_errored {
        issues.push(Issue::ConfidenceMissing);
    }
    snapshot.set_path("signals.vector", json!(signal_pass.signal_vector));
    snapshot.set_path("signals.raw", serde_json::to_value(&signal_pass.raw_registry)?);

    // C7
    let regime_reading = state.classifier.classify(&bars, fetch_meta.trimmed_incomplete_bar);
    let regime = regime_reading.regime;
    if regime == Regime::Unknown {
        issues.push(Issue::RegimeUnknown);
    }
    snapshot.set_path("regime.label", json!(regime.as_str()));
    snapshot.set_path("regime.atrp_z", json!(regime_reading.atrp_z));
    snapshot.set_path("regime.bb_width_z", json!(regime_reading.bb_width_z));
    snapshot.set_path("regime.ret_g5", json!(regime_reading.ret_g5));
    snapshot.set_path("regime.ret_g5_z", json!(regime_reading.ret_g5_z));

    // C8
    let decision = pt_council::decide(
        config,
        registry,
        &signal_pass.signal_vector,
        regime.as_str(),
        paths.mode().is_paper(),
    );
    snapshot.set_path("decision.buckets", serde_json::to_value(&decision.buckets)?);
    snapshot.set_path("decision.final.dir", json!(decision.final_.dir));
    snapshot.set_path("decision.final.conf", json!(decision.final_.conf));
    snapshot.set_path("decision.gates.entry_min_conf", json!(decision.gates.entry_min_conf));
    snapshot.set_path("decision.gates.exit_min_conf", json!(decision.gates.exit_min_conf));
    snapshot.set_path("decision.gates.reverse_min_conf", json!(decision.gates.reverse_min_conf));

    // C9 (velocity, decay, compression, self-trust; opportunity density
    // follows C11 below since it needs that tick's eligibility verdict)
    let pci = if signal_pass.signal_vector.is_empty() {
        0.0
    } else {
        signal_pass.signal_vector.iter().sum::<f64>() / signal_pass.signal_vector.len() as f64
    };
    let mut current_values = BTreeMap::new();
    current_values.insert("pci".to_string(), pci);
    current_values.insert("confidence".to_string(), decision.final_.conf);

    let velocities = compute_velocities(&mut primitive_state, now, &current_values);
    let mut half_lives = BTreeMap::new();
    half_lives.insert("pci".to_string(), PRIMITIVE_HALF_LIFE_SECS);
    half_lives.insert("confidence".to_string(), PRIMITIVE_HALF_LIFE_SECS);
    let decays = compute_decays(&mut primitive_state, now, &current_values, &half_lives);
    primitive_state.save(&paths.primitive_state())?;

    snapshot.set_path("primitives.pci.value", json!(pci));
    snapshot.set_path(
        "primitives.pci.velocity_per_s",
        json!(velocities.get("pci_per_s").copied().flatten()),
    );
    snapshot.set_path(
        "primitives.pci.decayed",
        json!(decays.get("pci").and_then(|d| d.decayed)),
    );
    snapshot.set_path("primitives.confidence.value", json!(decision.final_.conf));
    snapshot.set_path(
        "primitives.confidence.velocity_per_s",
        json!(velocities.get("confidence_per_s").copied().flatten()),
    );
    snapshot.set_path(
        "primitives.confidence.decayed",
        json!(decays.get("confidence").and_then(|d| d.decayed)),
    );

    let score = compression_score(&bars, &closes);
    if score.is_none() {
        issues.push(Issue::CompressionNull);
    }
    let is_compressed = score.map(|s| s >= DEFAULT_COMPRESSION_THRESHOLD).unwrap_or(false);
    let mut compression_state =
        CompressionState::load(&paths.compression_state()).context("load compression_state.json")?;
    let time_in_compression_s = update_time_in_compression(&mut compression_state, now, is_compressed);
    compression_state.save(&paths.compression_state())?;

    snapshot.set_path("primitives.compression.score", json!(score));
    snapshot.set_path("primitives.compression.is_compressed", json!(is_compressed));
    snapshot.set_path(
        "primitives.compression.time_in_compression_s",
        json!(time_in_compression_s),
    );

    let self_trust = compute_self_trust_from_trade_log(&paths.self_trust_state(), &paths.trades(), now)
        .context("compute self-trust from trade log")?;
    if self_trust.is_none() {
        issues.push(Issue::SelfTrustUnavailable);
    }
    snapshot.set_path(
        "primitives.self_trust.score",
        json!(self_trust.map(|m| m.self_trust_score)),
    );
    snapshot.set_path("primitives.self_trust.rmse", json!(self_trust.map(|m| m.rmse)));

    // C10
    let risk_eval = pt_risk::run(paths, now).context("evaluate risk adapter")?;
    snapshot.set_path("risk.equity", json!(risk_eval.equity));
    snapshot.set_path("risk.peak", json!(risk_eval.peak));
    snapshot.set_path("risk.drawdown", json!(risk_eval.drawdown));
    snapshot.set_path("risk.band", json!(risk_eval.band));
    snapshot.set_path("risk.mult", json!(risk_eval.mult));
    snapshot.set_path("risk.reason", json!(risk_eval.reason));

    // C11
    let mut entry_cfg = config.entry.clone();
    if stale_feed {
        entry_cfg.allow_opens = false;
    }
    let price = bars.last().map(|b| b.close).unwrap_or(0.0);
    let tick_inputs = TickInputs {
        symbol,
        timeframe,
        regime: regime.as_str(),
        final_dir: decision.final_.dir,
        final_conf: decision.final_.conf,
        price,
        risk_mult: risk_eval.mult,
        risk_band: risk_eval.band.as_deref(),
        entry_min_conf: decision.gates.entry_min_conf,
        exit_min_conf: decision.gates.exit_min_conf,
        reverse_min_conf: decision.gates.reverse_min_conf,
        defensive_softening: config.gates.defensive_softening,
        now,
    };

    let outcome = on_tick(
        state.position.take(),
        &tick_inputs,
        &entry_cfg,
        &config.exit,
        &config.accounting,
        paths,
    )
    .context("advance entry/exit state machine")?;
    state.position = outcome.position;

    if !outcome.eligible {
        issues.push(Issue::OpportunityLow);
    }

    snapshot.set_path("execution.opened", json!(outcome.opened));
    snapshot.set_path("execution.closed", json!(outcome.closed));
    snapshot.set_path("execution.flipped", json!(outcome.flipped));
    snapshot.set_path("execution.eligible", json!(outcome.eligible));
    snapshot.set_path(
        "execution.exit_reason",
        json!(outcome.exit_reason.map(|r| r.as_str())),
    );
    match &state.position {
        Some(pos) => {
            snapshot.set_path("execution.position.dir", json!(pos.dir));
            snapshot.set_path("execution.position.entry_px", json!(pos.entry_px));
            snapshot.set_path("execution.position.bars_open", json!(pos.bars_open));
        }
        None => snapshot.set_path("execution.position", serde_json::Value::Null),
    }

    // Opportunity density, logically a primitive but mechanically downstream
    // of C11's eligibility verdict.
    let mut opportunity_state =
        OpportunityState::load(&paths.opportunity_state()).context("load opportunity_state.json")?;
    let opp_metrics = update_opportunity_state(
        &mut opportunity_state,
        now,
        regime.as_str(),
        outcome.eligible,
        config.density.half_life_minutes,
    );
    opportunity_state.save(&paths.opportunity_state())?;

    let density_floor = config.density_floors.floor_for(regime.as_str());
    snapshot.set_path("metrics.opportunity.eligible", json!(opp_metrics.eligible));
    snapshot.set_path(
        "metrics.opportunity.density_current",
        json!(opp_metrics.density_current),
    );
    snapshot.set_path(
        "metrics.opportunity.global_density_ewma",
        json!(opp_metrics.global_density_ewma),
    );
    snapshot.set_path("metrics.opportunity.density_floor", json!(density_floor));

    // C12 trade log / equity curve already appended inside `on_tick`; just
    // refresh the derived PF reports from the log each tick.
    update_pf_reports(&paths.trades(), &paths.pf_local(), &paths.pf_live())
        .context("refresh pf_local/pf_live reports")?;

    // C13
    write_latest_snapshot(paths, &snapshot)?;
    beat(paths, now)?;

    Ok(TickReport { advanced: true, issues })
}
