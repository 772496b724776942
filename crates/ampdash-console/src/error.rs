use ampdash_client::{ClientError, NormalizeError};
use ampdash_core::CoreError;
use thiserror::Error;

/// Failures of a console operation. The `Display` text is what the error
/// banner shows.
#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error(transparent)]
    Upstream(#[from] ClientError),

    #[error("could not read upstream data: {0}")]
    Normalize(#[from] NormalizeError),

    #[error("invalid budget \"{input}\": {reason}")]
    InvalidBudget { input: String, reason: String },

    #[error(transparent)]
    InvalidDateRange(#[from] CoreError),

    #[error("invalid {kind} filter \"{value}\"")]
    InvalidFilter { kind: &'static str, value: String },

    #[error("no marketer selected")]
    NoMarketerSelected,
}

impl ConsoleError {
    /// True for errors raised locally before any remote call was made.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::InvalidBudget { .. }
                | Self::InvalidDateRange(_)
                | Self::InvalidFilter { .. }
                | Self::NoMarketerSelected
        )
    }
}
