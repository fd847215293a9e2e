use std::fmt::Display;

use thiserror::Error;

/// Why a single probe did not produce a value.
///
/// None of these escape the profiler's accessors; they only steer the
/// fallback chains and decide how loudly a miss is logged.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ProbeError {
    /// The source does not exist on this platform/architecture. Skipped quietly.
    #[error("source unavailable")]
    Unavailable,

    /// The source exists but the query failed (permissions, missing key, bad data).
    #[error("{origin} query failed: {reason}")]
    QueryFailed { origin: &'static str, reason: String },

    /// Every source in a chain was exhausted.
    #[error("no source produced a value")]
    NoData,
}

impl ProbeError {
    pub fn failed(origin: &'static str, reason: impl Display) -> Self {
        ProbeError::QueryFailed {
            origin,
            reason: reason.to_string(),
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(self, ProbeError::Unavailable)
    }
}

impl From<anyhow::Error> for ProbeError {
    fn from(e: anyhow::Error) -> Self {
        ProbeError::failed("driver", format!("{e:#}"))
    }
}

pub type ProbeResult<T> = std::result::Result<T, ProbeError>;
