//! Settlement models.

use crate::game::Chips;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Final balance of one player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SettlementEntry {
    pub player: String,
    #[serde(rename = "chip_amount")]
    pub chips: Chips,
}

/// Outcome of a finished hand sequence, reported once to the ledger.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct Settlement {
    pub game_id: String,
    pub entries: Vec<SettlementEntry>,
    pub proof: String,
    pub settled_at: DateTime<Utc>,
}

impl Settlement {
    pub fn new(game_id: String, entries: Vec<SettlementEntry>) -> Self {
        Self {
            game_id,
            entries,
            proof: String::new(),
            settled_at: Utc::now(),
        }
    }

    /// Total chips across all entries.
    pub fn total(&self) -> Chips {
        self.entries.iter().map(|e| e.chips).sum()
    }
}
