//! Poker primitives shared by the room engine.
//!
//! This module provides:
//! - Cards, chip amounts and betting labels
//! - Hand-strength evaluation
//! - Side pot construction and showdown payouts

pub mod entities;
pub mod evaluator;
pub mod pot;

pub use entities::{BetAction, Card, CardError, Chips, ClassicCard, Suit, Value};
pub use evaluator::{HandCategory, HandEvaluator, HandStrength, StandardEvaluator};
pub use pot::{HandPot, award_pots, compute_pots};
