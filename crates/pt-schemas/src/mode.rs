use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Process-wide operating mode. Selects persistence targets (`Paths`) and
/// gates the PAPER-only risk-promotion rule in `pt-risk`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Paper,
    DryRun,
    Live,
}

impl Mode {
    pub fn is_paper(self) -> bool {
        matches!(self, Mode::Paper)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Mode::Paper => "PAPER",
            Mode::DryRun => "DRY_RUN",
            Mode::Live => "LIVE",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseModeError(pub String);

impl fmt::Display for ParseModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown mode: {}", self.0)
    }
}

impl std::error::Error for ParseModeError {}

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "PAPER" => Ok(Mode::Paper),
            "DRY_RUN" | "DRYRUN" => Ok(Mode::DryRun),
            "LIVE" => Ok(Mode::Live),
            other => Err(ParseModeError(other.to_string())),
        }
    }
}

impl Default for Mode {
    fn default() -> Self {
        Mode::Paper
    }
}
