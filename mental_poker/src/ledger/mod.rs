//! Settlement ledger seam.
//!
//! When a room's hand sequence ends, final balances are reported exactly
//! once through [`SettlementLedger::end_game`]. Failures are logged by the
//! caller and never retried.

pub mod errors;
pub mod http;
pub mod models;

pub use errors::{LedgerError, LedgerResult};
pub use http::HttpLedger;
pub use models::{Settlement, SettlementEntry};

use async_trait::async_trait;

/// Destination for final chip balances
#[async_trait]
pub trait SettlementLedger: Send + Sync {
    /// Finalize a game with the given balances
    async fn end_game(&self, settlement: &Settlement) -> LedgerResult<()>;
}

/// Ledger that only logs settlements, for deployments without one.
#[derive(Debug, Default)]
pub struct LoggingLedger;

#[async_trait]
impl SettlementLedger for LoggingLedger {
    async fn end_game(&self, settlement: &Settlement) -> LedgerResult<()> {
        log::info!(
            "Game {} ended with {} chips across {} players",
            settlement.game_id,
            settlement.total(),
            settlement.entries.len()
        );
        Ok(())
    }
}
