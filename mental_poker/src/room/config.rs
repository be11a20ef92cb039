//! Room configuration models.

use crate::{
    constants::{
        DEFAULT_BIG_BLIND, DEFAULT_BUY_IN, DEFAULT_SEATS, DEFAULT_SMALL_BLIND, MAX_SEATS,
    },
    game::Chips,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// When a room stops dealing and reports final balances
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementPolicy {
    /// Settle only when exactly two players remain and one of them is broke
    HeadsUp,
    /// Settle whenever at most one session holder still has chips
    LastStanding,
}

impl std::fmt::Display for SettlementPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementPolicy::HeadsUp => write!(f, "heads_up"),
            SettlementPolicy::LastStanding => write!(f, "last_standing"),
        }
    }
}

impl std::str::FromStr for SettlementPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "heads_up" => Ok(SettlementPolicy::HeadsUp),
            "last_standing" => Ok(SettlementPolicy::LastStanding),
            other => Err(format!("Unknown settlement policy: {}", other)),
        }
    }
}

/// Room configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Seat count, fixed for the room's lifetime (default: 9)
    pub max_seats: usize,

    /// Small blind amount
    pub small_blind: Chips,

    /// Big blind amount
    pub big_blind: Chips,

    /// Seconds a player has to act before being folded
    pub action_timeout_secs: u64,

    /// Seconds between automatic hand starts
    pub idle_interval_secs: u64,

    /// Seated players that trigger an immediate start (0 disables)
    pub auto_start_players: usize,

    /// Stack given to players joining without a buy-in
    pub default_buy_in: Chips,

    /// End-of-game rule
    pub settlement: SettlementPolicy,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            max_seats: DEFAULT_SEATS,
            small_blind: DEFAULT_SMALL_BLIND,
            big_blind: DEFAULT_BIG_BLIND,
            action_timeout_secs: 10,
            idle_interval_secs: 6,
            auto_start_players: 3,
            default_buy_in: DEFAULT_BUY_IN,
            settlement: SettlementPolicy::HeadsUp,
        }
    }
}

impl RoomConfig {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_seats < 2 || self.max_seats > MAX_SEATS {
            return Err(format!("Max seats must be between 2 and {}", MAX_SEATS));
        }

        if self.small_blind <= 0 {
            return Err("Small blind must be positive".to_string());
        }

        if self.big_blind <= self.small_blind {
            return Err("Big blind must be greater than small blind".to_string());
        }

        if self.idle_interval_secs == 0 {
            return Err("Idle interval must be at least one second".to_string());
        }

        if self.default_buy_in < self.big_blind {
            return Err("Default buy-in must cover the big blind".to_string());
        }

        Ok(())
    }

    /// Action timeout; zero waits indefinitely
    pub fn action_timeout(&self) -> Duration {
        Duration::from_secs(self.action_timeout_secs)
    }

    pub fn idle_interval(&self) -> Duration {
        Duration::from_secs(self.idle_interval_secs)
    }
}
