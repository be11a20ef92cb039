//! Card-crypto collaborator error types.

use crate::game::CardError;
use thiserror::Error;

/// Card-crypto errors
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Transport failure talking to the collaborator
    #[error("Crypto service request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Collaborator answered with a non-success status
    #[error("Crypto service returned {status}: {body}")]
    Service { status: u16, body: String },

    /// A participant refused a shuffle proof
    #[error("Shuffle rejected by player {0}")]
    ShuffleRejected(String),

    /// Collaborator omitted a card it was asked about
    #[error("Crypto service returned no entry for card {0}")]
    MissingCard(String),

    /// Classic card names the engine does not know
    #[error("Invalid card in deck: {0}")]
    Card(#[from] CardError),

    /// Session cannot be built for this many players
    #[error("Cannot establish a game session for {0} players")]
    NotEnoughPlayers(usize),
}

/// Result type for card-crypto operations
pub type CryptoResult<T> = Result<T, CryptoError>;
