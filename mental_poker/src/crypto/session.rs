//! Per-hand session establishment.

use super::{
    CardCrypto, GameSession, PlayerSession,
    errors::{CryptoError, CryptoResult},
    models::{AggregatePlayer, PlayerKeys, SetupRequest, VerifyShuffleRequest},
};
use crate::game::Card;
use std::{collections::HashMap, sync::Arc};
use uuid::Uuid;

/// Build a game session shared by `user_ids`.
///
/// Runs the full setup protocol: fresh deck, per-player keys, every player
/// computes the joined key, the first player masks the deck, then each
/// player in turn shuffles it while all players verify that shuffle. The
/// last shuffle becomes the agreed deck.
///
/// # Returns
///
/// * `(GameSession, Vec<PlayerSession>)` - Player sessions in `user_ids` order
pub async fn establish(
    crypto: &Arc<dyn CardCrypto>,
    user_ids: &[String],
) -> CryptoResult<(GameSession, Vec<PlayerSession>)> {
    if user_ids.is_empty() {
        return Err(CryptoError::NotEnoughPlayers(0));
    }

    let deck = crypto.initialize_deck().await?;
    let mut card_map = HashMap::with_capacity(deck.cards.len());
    for initial in &deck.cards {
        card_map.insert(initial.card.clone(), Card::try_from(&initial.classic_card)?);
    }
    let mut game = GameSession {
        game_id: Uuid::new_v4().to_string(),
        seed_hex: deck.seed_hex.clone(),
        card_map,
        shuffled: Vec::new(),
    };

    let mut keyed: Vec<(String, String, PlayerKeys)> = Vec::with_capacity(user_ids.len());
    for user_id in user_ids {
        let game_user_id = Uuid::new_v4().to_string();
        let keys = crypto
            .setup_player(&SetupRequest {
                user_id: user_id.clone(),
                game_id: game.game_id.clone(),
                game_user_id: game_user_id.clone(),
                seed_hex: game.seed_hex.clone(),
            })
            .await?;
        keyed.push((user_id.clone(), game_user_id, keys));
    }

    let aggregate: Vec<AggregatePlayer> = keyed
        .iter()
        .map(|(_, game_user_id, keys)| AggregatePlayer {
            game_id: game.game_id.clone(),
            game_user_id: game_user_id.clone(),
            user_key_proof: keys.user_key_proof.clone(),
            public_key: keys.user_public_key.clone(),
        })
        .collect();

    let mut players = Vec::with_capacity(keyed.len());
    for (user_id, game_user_id, keys) in keyed {
        let joined_key = crypto
            .compute_aggregate_key(&aggregate, &game.seed_hex)
            .await?;
        players.push(PlayerSession::new(
            Arc::clone(crypto),
            user_id,
            game_user_id,
            &game,
            keys,
            joined_key,
        ));
    }

    let initial: Vec<String> = deck.cards.into_iter().map(|c| c.card).collect();
    let mut current: Vec<String> = crypto
        .mask(&game.seed_hex, &initial, &players[0].joined_key)
        .await?
        .into_iter()
        .map(|masked| masked.masked_card)
        .collect();

    for shuffler in &players {
        let shuffled = crypto
            .shuffle(&game.seed_hex, &current, &shuffler.joined_key)
            .await?;
        for verifier in &players {
            let request = VerifyShuffleRequest {
                proof: shuffled.shuffle_proof.clone(),
                joined_key: verifier.joined_key.clone(),
                seed_hex: game.seed_hex.clone(),
                origin_cards: current.clone(),
                shuffled_cards: shuffled.cards.clone(),
            };
            crypto
                .verify_shuffle(&request)
                .await
                .map_err(|e| match e {
                    CryptoError::Service { .. } => {
                        CryptoError::ShuffleRejected(verifier.user_id.clone())
                    }
                    other => other,
                })?;
        }
        log::debug!(
            "Game {}: shuffle by {} verified by {} players",
            game.game_id,
            shuffler.user_id,
            players.len()
        );
        current = shuffled.cards;
    }

    game.shuffled = current;
    Ok((game, players))
}
