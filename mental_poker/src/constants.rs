//! Engine-wide limits and defaults.

use crate::game::entities::Chips;

/// Hard cap on seats per room.
pub const MAX_SEATS: usize = 10;

/// Seats used when a room is created without an explicit capacity.
pub const DEFAULT_SEATS: usize = 9;

/// Inbound messages buffered per occupant before new ones are dropped.
pub const MAILBOX_CAPACITY: usize = 128;

/// Pending player decisions buffered per occupant.
pub const ACTION_CAPACITY: usize = 1;

pub const DEFAULT_SMALL_BLIND: Chips = 500;
pub const DEFAULT_BIG_BLIND: Chips = 1000;

/// Stack given to an occupant that joins without naming a buy-in.
pub const DEFAULT_BUY_IN: Chips = 100_000_000;

/// Hole cards dealt to each participant.
pub const HOLE_CARDS: usize = 2;
