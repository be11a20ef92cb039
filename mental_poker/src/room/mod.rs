//! Rooms, occupants and the hand engine.
//!
//! A [`Room`] owns a table of seats and plays a sequence of hands among its
//! [`Occupant`]s. Each occupant is fed by a [`Connection`] whose inbound
//! messages land in a bounded mailbox; [`serve_occupant`] routes them to
//! the room. Hands are dealt through the [`CardDealCoordinator`], which
//! gathers reveal tokens from every other participant before a card is
//! decoded, and settle through the ledger once the game is over.
//!
//! Lock order is room state first, then occupant state. Occupant state
//! locks are never held across an await.

pub mod actor;
pub mod betting;
pub mod config;
pub mod connection;
pub mod deal;
pub mod dispatch;
pub mod errors;
pub mod messages;
pub mod occupant;
pub mod registry;

pub use actor::{HandReport, HandStage, Room};
pub use config::{RoomConfig, SettlementPolicy};
pub use connection::{ChannelConnection, ClientEnd, Connection};
pub use deal::CardDealCoordinator;
pub use dispatch::serve_occupant;
pub use errors::{ConnectionError, RoomError, RoomResult};
pub use messages::{ActionIntent, Message, OccupantView, Presence, PresenceAction, RoomView};
pub use occupant::{BetOutcome, Occupant, OccupantState};
pub use registry::{PlayerInfo, RoomRegistry};
