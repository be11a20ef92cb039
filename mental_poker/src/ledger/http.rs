//! HTTP client for the settlement ledger.

use super::{
    SettlementLedger,
    errors::{LedgerError, LedgerResult},
    models::Settlement,
};
use async_trait::async_trait;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Ledger reached with a single `POST {base}/end_game`
pub struct HttpLedger {
    base_url: String,
    client: reqwest::Client,
}

impl HttpLedger {
    pub fn new(base_url: impl Into<String>) -> LedgerResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[async_trait]
impl SettlementLedger for HttpLedger {
    async fn end_game(&self, settlement: &Settlement) -> LedgerResult<()> {
        if settlement.entries.is_empty() {
            return Err(LedgerError::InvalidSettlement(
                "no settlement entries".to_string(),
            ));
        }

        let response = self
            .client
            .post(format!("{}/end_game", self.base_url))
            .json(settlement)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
            return Err(LedgerError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        log::info!(
            "Game {} settled for {} players",
            settlement.game_id,
            settlement.entries.len()
        );
        Ok(())
    }
}
