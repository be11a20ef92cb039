//! HTTP/JSON client for the card-crypto service.

use super::{
    CardCrypto,
    errors::{CryptoError, CryptoResult},
    models::{
        AggregatePlayer, DealtCardRecord, InitializedDeck, MaskedCard, PlayerKeys, RevealToken,
        SetupRequest, ShuffledDeck, VerifyShuffleRequest,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::{collections::HashMap, time::Duration};

/// Where the card-crypto service listens unless configured otherwise.
pub const DEFAULT_CRYPTO_URL: &str = "http://127.0.0.1:8000";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Serialize)]
struct AggregateKeyRequest<'a> {
    players: &'a [AggregatePlayer],
    seed_hex: &'a str,
}

#[derive(Deserialize)]
struct AggregateKeyResponse {
    joined_key: String,
}

#[derive(Serialize)]
struct DeckRequest<'a> {
    seed_hex: &'a str,
    cards: &'a [String],
    joined_key: &'a str,
}

#[derive(Deserialize)]
struct MaskResponse {
    cards: Vec<MaskedCard>,
}

#[derive(Serialize)]
struct RevealTokenRequest<'a> {
    game_user_id: &'a str,
    seed_hex: &'a str,
    reveal_cards: &'a [String],
}

#[derive(Deserialize)]
struct RevealTokenResponse {
    token_map: HashMap<String, RevealToken>,
}

#[derive(Serialize)]
struct PeekRequest<'a> {
    game_user_id: &'a str,
    seed_hex: &'a str,
    peek_cards: &'a [DealtCardRecord],
}

#[derive(Deserialize)]
struct PeekResponse {
    card_map: HashMap<String, String>,
}

#[derive(Serialize)]
struct ClearRequest<'a> {
    user_id: &'a str,
    game_id: &'a str,
    game_user_id: &'a str,
}

/// Card-crypto collaborator reached over HTTP
pub struct HttpCardCrypto {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCardCrypto {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Service root, e.g. `http://127.0.0.1:8000`
    pub fn new(base_url: impl Into<String>) -> CryptoResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn check(response: reqwest::Response) -> CryptoResult<reqwest::Response> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response
            .text()
            .await
            .unwrap_or_else(|e| format!("Failed to read error response: {}", e));
        Err(CryptoError::Service {
            status: status.as_u16(),
            body,
        })
    }

    async fn post<B, R>(&self, path: &str, body: &B) -> CryptoResult<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// POST whose response body carries nothing the engine needs.
    async fn post_unit<B>(&self, path: &str, body: &B) -> CryptoResult<()>
    where
        B: Serialize + ?Sized + Sync,
    {
        let response = self.client.post(self.url(path)).json(body).send().await?;
        Self::check(response).await?;
        Ok(())
    }
}

#[async_trait]
impl CardCrypto for HttpCardCrypto {
    async fn initialize_deck(&self) -> CryptoResult<InitializedDeck> {
        let response = self.client.get(self.url("/deck/initialize")).send().await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    async fn setup_player(&self, request: &SetupRequest) -> CryptoResult<PlayerKeys> {
        self.post("/deck/setup", request).await
    }

    async fn compute_aggregate_key(
        &self,
        players: &[AggregatePlayer],
        seed_hex: &str,
    ) -> CryptoResult<String> {
        let response: AggregateKeyResponse = self
            .post(
                "/deck/compute_aggregate_key",
                &AggregateKeyRequest { players, seed_hex },
            )
            .await?;
        Ok(response.joined_key)
    }

    async fn mask(
        &self,
        seed_hex: &str,
        cards: &[String],
        joined_key: &str,
    ) -> CryptoResult<Vec<MaskedCard>> {
        let response: MaskResponse = self
            .post(
                "/deck/mask",
                &DeckRequest {
                    seed_hex,
                    cards,
                    joined_key,
                },
            )
            .await?;
        Ok(response.cards)
    }

    async fn shuffle(
        &self,
        seed_hex: &str,
        cards: &[String],
        joined_key: &str,
    ) -> CryptoResult<ShuffledDeck> {
        self.post(
            "/deck/shuffle",
            &DeckRequest {
                seed_hex,
                cards,
                joined_key,
            },
        )
        .await
    }

    async fn verify_shuffle(&self, request: &VerifyShuffleRequest) -> CryptoResult<()> {
        self.post_unit("/deck/verify_shuffle", request).await
    }

    async fn compute_reveal_token(
        &self,
        game_user_id: &str,
        seed_hex: &str,
        cards: &[String],
    ) -> CryptoResult<HashMap<String, RevealToken>> {
        let response: RevealTokenResponse = self
            .post(
                "/deck/reveal_token",
                &RevealTokenRequest {
                    game_user_id,
                    seed_hex,
                    reveal_cards: cards,
                },
            )
            .await?;
        Ok(response.token_map)
    }

    async fn peek_cards(
        &self,
        game_user_id: &str,
        seed_hex: &str,
        records: &[DealtCardRecord],
    ) -> CryptoResult<HashMap<String, String>> {
        let response: PeekResponse = self
            .post(
                "/deck/peek_cards",
                &PeekRequest {
                    game_user_id,
                    seed_hex,
                    peek_cards: records,
                },
            )
            .await?;
        Ok(response.card_map)
    }

    async fn clear_player(
        &self,
        user_id: &str,
        game_id: &str,
        game_user_id: &str,
    ) -> CryptoResult<()> {
        self.post_unit(
            "/deck/clear",
            &ClearRequest {
                user_id,
                game_id,
                game_user_id,
            },
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let crypto = HttpCardCrypto::new("http://localhost:8000/").unwrap();
        assert_eq!(
            crypto.url("/deck/setup"),
            "http://localhost:8000/deck/setup"
        );
    }

    #[test]
    fn test_peek_request_shape() {
        let records = vec![DealtCardRecord {
            card: "m1".to_string(),
            reveal_token: vec![],
        }];
        let json = serde_json::to_value(PeekRequest {
            game_user_id: "u1",
            seed_hex: "ab",
            peek_cards: &records,
        })
        .unwrap();
        assert_eq!(json["peek_cards"][0]["card"], "m1");
        assert_eq!(json["game_user_id"], "u1");
    }
}
