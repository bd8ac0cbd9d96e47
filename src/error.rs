use chrono::NaiveDate;

use crate::models::SchemeCode;

/// Errors surfaced by the valuation engine.
///
/// Data-integrity problems are never papered over: an invalid lot rejects
/// its whole batch, and a missing price is reported rather than valued as
/// zero. `NoPriceAvailable` ("no data at or before this date") is kept
/// distinct from `PriceSourceUnavailable` ("the source is unreachable").
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// No NAV cached or fetchable on or before the requested date.
    #[error("no NAV for scheme {scheme} on or before {date}")]
    NoPriceAvailable { scheme: SchemeCode, date: NaiveDate },

    /// A lot that fails validation or would corrupt the ledger.
    #[error("invalid lot: {reason}")]
    InvalidLot { reason: String },

    /// An ISIN with no scheme-code mapping.
    #[error("no scheme code mapped for ISIN {isin}")]
    UnmappedFund { isin: String },

    /// The NAV source stayed unreachable after the configured retries.
    #[error("NAV source unavailable for scheme {scheme}: {reason}")]
    PriceSourceUnavailable { scheme: SchemeCode, reason: String },

    /// A scheme code with no entries in the ledger.
    #[error("scheme {scheme} has no ledger entries")]
    UnknownFund { scheme: SchemeCode },

    /// A structurally impossible request (reversed date window, no dates,
    /// unrecognized granularity, ...).
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Underlying store failure: I/O, malformed cache file, and the like.
    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}

impl EngineError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        EngineError::InvalidRequest(message.into())
    }
}
