//! Room engine error types.

use crate::{crypto::CryptoError, ledger::LedgerError};
use thiserror::Error;

/// Transport errors surfaced by a [`super::Connection`]
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Peer sent something that is not a message
    #[error("Malformed message: {0}")]
    Decode(String),

    /// Underlying transport failed
    #[error("Connection failed: {0}")]
    Transport(String),

    /// Peer is gone
    #[error("Connection closed")]
    Closed,
}

/// Room errors
#[derive(Debug, Error)]
pub enum RoomError {
    /// No message arrived in time
    #[error("Timed out waiting for player")]
    Timeout,

    /// Mailbox or connection torn down
    #[error("Connection closed")]
    Closed,

    /// More cards requested than the deck has left
    #[error("Deck exhausted: requested {requested}, remaining {remaining}")]
    DeckExhausted { requested: usize, remaining: usize },

    /// A collaborator call failed while unmasking cards
    #[error("Card reveal failed: {0}")]
    RevealFailed(String),

    /// Public cards requested with nobody seated
    #[error("No occupants to reveal cards")]
    NoOccupants,

    /// Ledger refused or never received the settlement
    #[error("Settlement failed: {0}")]
    SettlementFailed(#[from] LedgerError),

    /// Every seat is taken
    #[error("Room is full")]
    RoomFull,

    /// Room has been torn down
    #[error("Room is closed")]
    RoomClosed,

    /// Occupant has no session for the current hand
    #[error("Occupant {0} has no game session")]
    NoSession(String),

    /// Room configuration rejected
    #[error("Invalid room configuration: {0}")]
    InvalidConfig(String),

    /// Session establishment failed
    #[error("Game setup failed: {0}")]
    Setup(#[from] CryptoError),
}

impl RoomError {
    /// Get a client-safe error message
    ///
    /// Collaborator and ledger failures are reduced to a generic text so
    /// service addresses and payloads never reach players.
    pub fn client_message(&self) -> String {
        match self {
            RoomError::RevealFailed(_) | RoomError::Setup(_) => "Card service error".to_string(),
            RoomError::SettlementFailed(_) => "Settlement error".to_string(),
            RoomError::NoSession(_) => "Not in the current hand".to_string(),
            RoomError::DeckExhausted { .. } | RoomError::NoOccupants => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        }
    }

    /// Error code sent alongside the client message
    pub fn code(&self) -> u16 {
        match self {
            RoomError::Timeout => 408,
            RoomError::Closed | RoomError::RoomClosed => 410,
            RoomError::RoomFull => 409,
            RoomError::NoSession(_) => 403,
            RoomError::InvalidConfig(_) => 400,
            _ => 500,
        }
    }
}

/// Result type for room operations
pub type RoomResult<T> = Result<T, RoomError>;
