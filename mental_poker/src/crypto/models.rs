//! Request and response models exchanged with the card-crypto collaborator.

use crate::game::ClassicCard;
use serde::{Deserialize, Serialize};

/// Unmasked deck entry: opaque card identifier plus its rank and suit.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InitialCard {
    pub card: String,
    pub classic_card: ClassicCard,
}

/// Fresh deck and the seed all later calls are scoped to.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct InitializedDeck {
    pub cards: Vec<InitialCard>,
    pub seed_hex: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct KeyProof {
    pub commit: String,
    pub opening: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct SetupRequest {
    pub user_id: String,
    pub game_id: String,
    pub game_user_id: String,
    pub seed_hex: String,
}

/// Key material produced for one player of one game.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct PlayerKeys {
    pub user_public_key: String,
    pub user_key_proof: KeyProof,
}

/// A player's public key entry in the aggregate key computation.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct AggregatePlayer {
    pub game_id: String,
    pub game_user_id: String,
    pub user_key_proof: KeyProof,
    pub public_key: String,
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
pub struct PedersenProof {
    pub a: String,
    pub b: String,
    pub r: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct MaskedCard {
    pub masked_card: String,
    pub proof: PedersenProof,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ShuffledDeck {
    pub cards: Vec<String>,
    pub shuffle_proof: String,
}

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct VerifyShuffleRequest {
    pub proof: String,
    pub joined_key: String,
    pub seed_hex: String,
    pub origin_cards: Vec<String>,
    pub shuffled_cards: Vec<String>,
}

/// One player's contribution towards unmasking one card.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct RevealToken {
    pub token: String,
    pub proof: PedersenProof,
    pub public_key: String,
}

/// A masked card together with the reveal tokens collected for it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct DealtCardRecord {
    pub card: String,
    pub reveal_token: Vec<RevealToken>,
}
