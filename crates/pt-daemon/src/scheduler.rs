use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::Result;
use chrono::Utc;
use pt_config::EngineConfig;
use pt_feed::OhlcvProvider;
use pt_observability::{beat, create_incident, log_incident, write_loop_health, LoopHealth};
use pt_schemas::Paths;
use pt_signals::SignalEntry;
use tracing::{error, info, warn};

use crate::backoff::{backoff_duration, jittered_sleep_duration};
use crate::tick::{run_tick, EngineState};

const MAX_CONSECUTIVE_FAILURES: u32 = 10;

/// Installs a `Ctrl-C`/`SIGTERM` handler that flips `flag` once, so the
/// loop can check it between ticks instead of dying mid-write.
pub fn install_shutdown_signal() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let signal_flag = flag.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("shutdown signal received");
            signal_flag.store(true, Ordering::SeqCst);
        }
    });
    flag
}

/// Runs `run_tick` forever: jittered sleep on success, exponential backoff
/// with a ceiling on failure, and a clean exit after too many consecutive
/// failures so a process supervisor can restart fresh. A heartbeat and
/// `loop_health.json` are rewritten every iteration, success or failure.
#[allow(clippy::too_many_arguments)]
pub async fn run_forever(
    providers: Vec<Box<dyn OhlcvProvider>>,
    registry: Vec<SignalEntry>,
    config: EngineConfig,
    paths: Paths,
    symbol: String,
    timeframe: String,
    panic_threshold: f64,
    shutdown: Arc<AtomicBool>,
    debug_signals: bool,
) -> Result<()> {
    let mut state = EngineState::new(panic_threshold);
    let mut tick_count: u64 = 0;
    let mut consecutive_failures: u32 = 0;

    loop {
        if shutdown.load(Ordering::SeqCst) {
            info!("shutdown flag set, exiting loop cleanly");
            return Ok(());
        }

        let now = Utc::now();
        match run_tick(
            &providers, &registry, &config, &paths, &symbol, &timeframe, &mut state, now,
            debug_signals,
        )
        .await
        {
            Ok(report) => {
                if report.advanced {
                    tick_count += 1;
                }
                consecutive_failures = 0;
                let issues: Vec<String> = report.issues.iter().map(|i| i.to_string()).collect();
                if !issues.is_empty() {
                    warn!(?issues, "tick completed with issues");
                }
                let health = LoopHealth::ok(now, tick_count, issues);
                if let Err(e) = write_loop_health(&paths, &health) {
                    warn!(error = %e, "failed to write loop_health.json");
                }
                if let Err(e) = beat(&paths, now) {
                    warn!(error = %e, "failed to write heartbeat.json");
                }

                let sleep_for = jittered_sleep_duration();
                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {}
                    _ = wait_for_shutdown(&shutdown) => {}
                }
            }
            Err(e) => {
                consecutive_failures += 1;
                error!(error = %e, consecutive_failures, "tick failed");

                let incident = create_incident(
                    now,
                    "pt-daemon::scheduler::run_forever",
                    "TickFailure",
                    e.to_string(),
                    None,
                    Some(symbol.clone()),
                    Some(timeframe.clone()),
                    None,
                );
                log_incident(&paths, &incident);

                let health = LoopHealth::failing(now, tick_count, consecutive_failures, e.to_string());
                if let Err(write_err) = write_loop_health(&paths, &health) {
                    warn!(error = %write_err, "failed to write loop_health.json");
                }

                if consecutive_failures >= MAX_CONSECUTIVE_FAILURES {
                    error!(
                        consecutive_failures,
                        "too many consecutive failures, exiting for supervisor restart"
                    );
                    return Err(e.context("max consecutive tick failures exceeded"));
                }

                let sleep_for = backoff_duration(consecutive_failures);
                info!(?sleep_for, "backing off before retry");
                tokio::select! {
                    _ = tokio::time::sleep(sleep_for) => {}
                    _ = wait_for_shutdown(&shutdown) => {}
                }
            }
        }
    }
}

async fn wait_for_shutdown(flag: &Arc<AtomicBool>) {
    loop {
        if flag.load(Ordering::SeqCst) {
            return;
        }
        tokio::time::sleep(std::time::Duration::from_millis(200)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use pt_feed::FetchError;
    use pt_schemas::{Bar, Mode};
    use pt_signals::build_registry;
    use std::sync::atomic::AtomicUsize;

    struct CountingProvider {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl OhlcvProvider for CountingProvider {
        fn name(&self) -> &str {
            "binance_us"
        }

        async fn fetch(&self, _symbol: &str, _timeframe: &str, _limit: u32) -> Result<Vec<Bar>, FetchError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(FetchError::Timeout)
        }
    }

    #[tokio::test]
    async fn shutdown_flag_set_before_first_iteration_exits_immediately() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path(), Mode::Paper);
        let providers: Vec<Box<dyn OhlcvProvider>> = vec![Box::new(CountingProvider {
            calls: AtomicUsize::new(0),
        })];
        let registry = build_registry();
        let config = EngineConfig::default();
        let shutdown = Arc::new(AtomicBool::new(true));

        let result = run_forever(
            providers,
            registry,
            config,
            paths,
            "ETHUSDT".to_string(),
            "1h".to_string(),
            pt_regime::DEFAULT_PANIC_THRESHOLD,
            shutdown,
            false,
        )
        .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn a_failing_tick_records_an_incident_and_a_failing_loop_health_then_honors_shutdown_during_backoff() {
        let dir = tempfile::tempdir().unwrap();
        let paths = Paths::new(dir.path(), Mode::Paper);
        let providers: Vec<Box<dyn OhlcvProvider>> = vec![Box::new(CountingProvider {
            calls: AtomicUsize::new(0),
        })];
        let registry = build_registry();
        let config = EngineConfig::default();
        let shutdown = Arc::new(AtomicBool::new(false));

        // Flip the shutdown flag shortly after the first tick fails so the
        // loop exits cleanly from inside its backoff sleep rather than
        // actually waiting out the full (up to 300s) backoff duration.
        let flipper = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(std::time::Duration::from_millis(300)).await;
            flipper.store(true, Ordering::SeqCst);
        });

        let result = run_forever(
            providers,
            registry,
            config,
            paths.clone(),
            "ETHUSDT".to_string(),
            "1h".to_string(),
            pt_regime::DEFAULT_PANIC_THRESHOLD,
            shutdown,
            false,
        )
        .await;

        assert!(result.is_ok());
        let health: LoopHealth = pt_io::read_json_opt(&paths.loop_health()).unwrap().unwrap();
        assert_eq!(health.consecutive_failures, 1);
        assert_eq!(health.status, "failing");
        let incidents = std::fs::read_to_string(paths.incidents()).unwrap();
        assert_eq!(incidents.lines().count(), 1);
    }
}
