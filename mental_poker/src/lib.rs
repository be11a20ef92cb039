//! # Mental Poker
//!
//! A dealerless Texas Hold'em room engine. No party ever holds the deck in
//! the clear: the deck is jointly masked and shuffled by every player, and a
//! card is decoded only after every other participant has contributed a
//! reveal token for it. The cryptography lives in an external card-crypto
//! service; this crate drives the table around it.
//!
//! ## Core Modules
//!
//! - [`room`]: Rooms, occupants, betting rounds, card dealing and the registry
//! - [`game`]: Cards, hand evaluation and pot computation
//! - [`crypto`]: Card-crypto collaborator seam and per-hand sessions
//! - [`ledger`]: Settlement reporting
//!
//! ## Example
//!
//! ```no_run
//! use mental_poker::{
//!     HttpCardCrypto, LoggingLedger, RoomConfig, RoomRegistry, StandardEvaluator,
//! };
//! use std::sync::Arc;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let crypto = Arc::new(HttpCardCrypto::new("http://127.0.0.1:8000")?);
//! let registry = RoomRegistry::new(
//!     crypto,
//!     Arc::new(StandardEvaluator),
//!     Arc::new(LoggingLedger),
//!     RoomConfig::default(),
//! );
//! let room = registry.get_or_create("lobby").await;
//! assert_eq!(room.occupied(), 0);
//! # Ok(())
//! # }
//! ```

pub mod constants;

/// Cards, hand evaluation and pots.
pub mod game;
pub use game::{BetAction, Card, Chips, HandEvaluator, HandPot, StandardEvaluator, Suit};

/// Card-crypto collaborator.
pub mod crypto;
pub use crypto::{CardCrypto, CryptoError, GameSession, HttpCardCrypto, PlayerSession};

/// Settlement ledger.
pub mod ledger;
pub use ledger::{HttpLedger, LedgerError, LoggingLedger, Settlement, SettlementLedger};

/// Room engine.
pub mod room;
pub use room::{
    ChannelConnection, Connection, Message, Occupant, PresenceAction, Room, RoomConfig,
    RoomError, RoomRegistry, serve_occupant,
};
