//! Settlement ledger error types.

use thiserror::Error;

/// Ledger errors
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Transport failure talking to the ledger
    #[error("Ledger request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Ledger answered with a non-success status
    #[error("Ledger returned {status}: {body}")]
    Rejected { status: u16, body: String },

    /// Settlement does not describe a finished game
    #[error("Invalid settlement: {0}")]
    InvalidSettlement(String),
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
