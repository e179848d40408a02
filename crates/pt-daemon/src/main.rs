//! pt-daemon entry point.
//!
//! This file is intentionally thin: it loads config, builds the provider
//! list and signal registry, and hands off to the scheduler loop. Tick
//! logic lives in `tick.rs`; the loop itself lives in `scheduler.rs`.

use clap::Parser;
use pt_config::load_layered_config;
use pt_daemon::cli::Args;
use pt_daemon::scheduler::{install_shutdown_signal, run_forever};
use pt_feed::{BinanceProvider, OhlcvProvider, OkxProvider};
use pt_schemas::Paths;
use pt_signals::build_registry;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::from_filename(".env.local");

    init_tracing();

    let args = Args::parse();
    let mode = args.parsed_mode()?;
    let loaded = load_layered_config(&args.config)?;

    info!(
        symbol = %args.symbol,
        timeframe = %args.timeframe,
        mode = %mode,
        config_hash = %loaded.config_hash,
        "starting pt-daemon"
    );

    let paths = Paths::new(args.reports_dir, mode);
    let providers: Vec<Box<dyn OhlcvProvider>> = vec![
        Box::new(BinanceProvider::us()),
        Box::new(BinanceProvider::global()),
        Box::new(OkxProvider::new()),
    ];
    let registry = build_registry();
    let shutdown = install_shutdown_signal();
    let debug_signals = args.debug_signals;

    run_forever(
        providers,
        registry,
        loaded.config,
        paths,
        args.symbol,
        args.timeframe,
        pt_regime::DEFAULT_PANIC_THRESHOLD,
        shutdown,
        debug_signals,
    )
    .await
}

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();
}
