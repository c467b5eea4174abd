//! Installation state of the dictionary corpora.

use serde::Serialize;
use std::fmt;

/// Published on a watch channel by [`Dictionary`](crate::Dictionary) so a
/// stalled download shows up as "loading" rather than silence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IngestionStatus {
    NotInstalled,
    Loading { progress: u64, total: u64 },
    Ready,
    Failed { message: String },
}

impl IngestionStatus {
    pub fn is_ready(&self) -> bool {
        matches!(self, IngestionStatus::Ready)
    }

    /// Fraction loaded, when loading.
    pub fn fraction(&self) -> Option<f64> {
        match self {
            IngestionStatus::Loading { progress, total } if *total > 0 => {
                Some(*progress as f64 / *total as f64)
            }
            _ => None,
        }
    }
}

impl fmt::Display for IngestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestionStatus::NotInstalled => f.write_str("not installed"),
            IngestionStatus::Loading { progress, total } => {
                write!(f, "loading {progress}/{total}")
            }
            IngestionStatus::Ready => f.write_str("ready"),
            IngestionStatus::Failed { message } => write!(f, "failed: {message}"),
        }
    }
}
