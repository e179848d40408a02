use std::fmt;

#[derive(Clone, Debug)]
pub enum SignalError {
    InsufficientBars { needed: usize, have: usize },
    Generic(String),
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::InsufficientBars { needed, have } => {
                write!(f, "need at least {needed} bars, have {have}")
            }
            SignalError::Generic(s) => write!(f, "{s}"),
        }
    }
}

impl std::error::Error for SignalError {}
