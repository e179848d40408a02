use std::path::PathBuf;

use clap::Parser;
use pt_schemas::Mode;

/// Command-line surface for the paper-trading loop. Every argument falls
/// back to an environment variable so the daemon runs the same way under
/// a process supervisor as it does from a terminal.
#[derive(Parser, Debug, Clone)]
#[command(name = "pt-daemon", about = "Autonomous paper-trading tick loop")]
pub struct Args {
    /// Market symbol, e.g. "ETHUSDT".
    #[arg(long, env = "SYMBOL", default_value = "ETHUSDT")]
    pub symbol: String,

    /// Bar timeframe, e.g. "1h".
    #[arg(long, env = "TIMEFRAME", default_value = "1h")]
    pub timeframe: String,

    /// Operating mode: PAPER, DRY_RUN, or LIVE.
    #[arg(long, env = "MODE", default_value = "PAPER")]
    pub mode: String,

    /// Root directory for all on-disk state and logs.
    #[arg(long, env = "REPORTS_DIR", default_value = "reports")]
    pub reports_dir: PathBuf,

    /// YAML config layers, applied in order (later overrides earlier).
    #[arg(long = "config")]
    pub config: Vec<PathBuf>,

    /// Verbose per-signal debug logging.
    #[arg(long, env = "DEBUG_SIGNALS", default_value_t = false)]
    pub debug_signals: bool,
}

impl Args {
    pub fn parsed_mode(&self) -> Result<Mode, pt_schemas::mode::ParseModeError> {
        self.mode.parse()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn command_builds_without_panicking() {
        Args::command().debug_assert();
    }

    #[test]
    fn defaults_parse_to_paper_mode() {
        let args = Args::parse_from(["pt-daemon"]);
        assert_eq!(args.parsed_mode().unwrap(), Mode::Paper);
        assert_eq!(args.symbol, "ETHUSDT");
    }

    #[test]
    fn config_flag_is_repeatable() {
        let args = Args::parse_from([
            "pt-daemon",
            "--config",
            "base.yaml",
            "--config",
            "override.yaml",
        ]);
        assert_eq!(args.config.len(), 2);
    }

    #[test]
    fn mode_flag_overrides_the_default() {
        let args = Args::parse_from(["pt-daemon", "--mode", "dry_run"]);
        assert_eq!(args.parsed_mode().unwrap(), Mode::DryRun);
    }
}
