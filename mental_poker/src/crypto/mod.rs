//! Card-crypto collaborator seam.
//!
//! The engine never touches cryptographic primitives itself. Deck setup,
//! masking, shuffling with proofs, reveal tokens and card decoding are
//! delegated to an external service behind [`CardCrypto`]. This module holds
//! that trait, its HTTP client, the per-hand [`GameSession`] and the
//! per-player [`PlayerSession`] handles occupants carry during a hand.

pub mod errors;
pub mod http;
pub mod models;
pub mod session;

pub use errors::{CryptoError, CryptoResult};
pub use http::HttpCardCrypto;
pub use models::{
    AggregatePlayer, DealtCardRecord, InitialCard, InitializedDeck, KeyProof, MaskedCard,
    PedersenProof, PlayerKeys, RevealToken, SetupRequest, ShuffledDeck, VerifyShuffleRequest,
};
pub use session::establish;

use crate::game::Card;
use async_trait::async_trait;
use std::{collections::HashMap, fmt, sync::Arc};

/// Operations offered by the card-crypto collaborator.
///
/// Every call is a network round trip and is treated as atomic: it either
/// returns a full answer or an error that aborts the hand in progress.
#[async_trait]
pub trait CardCrypto: Send + Sync {
    /// Create a fresh unmasked deck and seed.
    async fn initialize_deck(&self) -> CryptoResult<InitializedDeck>;

    /// Generate key material for one player of one game.
    async fn setup_player(&self, request: &SetupRequest) -> CryptoResult<PlayerKeys>;

    /// Combine every player's public key into the joined key.
    async fn compute_aggregate_key(
        &self,
        players: &[AggregatePlayer],
        seed_hex: &str,
    ) -> CryptoResult<String>;

    /// Mask the initial deck under the joined key.
    async fn mask(
        &self,
        seed_hex: &str,
        cards: &[String],
        joined_key: &str,
    ) -> CryptoResult<Vec<MaskedCard>>;

    /// Shuffle and remask a deck, proving the permutation.
    async fn shuffle(
        &self,
        seed_hex: &str,
        cards: &[String],
        joined_key: &str,
    ) -> CryptoResult<ShuffledDeck>;

    /// Check another player's shuffle proof.
    async fn verify_shuffle(&self, request: &VerifyShuffleRequest) -> CryptoResult<()>;

    /// Compute this player's reveal tokens for the given masked cards.
    async fn compute_reveal_token(
        &self,
        game_user_id: &str,
        seed_hex: &str,
        cards: &[String],
    ) -> CryptoResult<HashMap<String, RevealToken>>;

    /// Decode masked cards into initial card identifiers.
    async fn peek_cards(
        &self,
        game_user_id: &str,
        seed_hex: &str,
        records: &[DealtCardRecord],
    ) -> CryptoResult<HashMap<String, String>>;

    /// Drop the collaborator's state for one player.
    async fn clear_player(
        &self,
        user_id: &str,
        game_id: &str,
        game_user_id: &str,
    ) -> CryptoResult<()>;
}

/// Deck state agreed by all participants of one hand.
#[derive(Clone, Debug, Default)]
pub struct GameSession {
    pub game_id: String,
    pub seed_hex: String,
    /// Initial card identifier to concrete card.
    pub card_map: HashMap<String, Card>,
    /// Final masked and shuffled deck, drawn from the front.
    pub shuffled: Vec<String>,
}

impl GameSession {
    pub fn card_for(&self, initial: &str) -> Option<Card> {
        self.card_map.get(initial).copied()
    }
}

/// One occupant's key material for one hand.
pub struct PlayerSession {
    pub user_id: String,
    pub game_user_id: String,
    pub game_id: String,
    pub seed_hex: String,
    pub public_key: String,
    pub key_proof: KeyProof,
    pub joined_key: String,
    crypto: Arc<dyn CardCrypto>,
}

impl fmt::Debug for PlayerSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayerSession")
            .field("user_id", &self.user_id)
            .field("game_user_id", &self.game_user_id)
            .field("game_id", &self.game_id)
            .finish_non_exhaustive()
    }
}

impl PlayerSession {
    pub fn new(
        crypto: Arc<dyn CardCrypto>,
        user_id: String,
        game_user_id: String,
        game: &GameSession,
        keys: PlayerKeys,
        joined_key: String,
    ) -> Self {
        Self {
            user_id,
            game_user_id,
            game_id: game.game_id.clone(),
            seed_hex: game.seed_hex.clone(),
            public_key: keys.user_public_key,
            key_proof: keys.user_key_proof,
            joined_key,
            crypto,
        }
    }

    /// Reveal tokens this player contributes for `cards`.
    pub async fn reveal_tokens(
        &self,
        cards: &[String],
    ) -> CryptoResult<HashMap<String, RevealToken>> {
        self.crypto
            .compute_reveal_token(&self.game_user_id, &self.seed_hex, cards)
            .await
    }

    /// Decode `records` with this player's key. Returns masked card to
    /// initial card identifier.
    pub async fn peek(&self, records: &[DealtCardRecord]) -> CryptoResult<HashMap<String, String>> {
        self.crypto
            .peek_cards(&self.game_user_id, &self.seed_hex, records)
            .await
    }

    pub async fn clear(&self) -> CryptoResult<()> {
        self.crypto
            .clear_player(&self.user_id, &self.game_id, &self.game_user_id)
            .await
    }
}
