//! Reveal-token quorum and card decoding.
//!
//! A masked card can only be decoded by its recipient once every other
//! participant of the hand has contributed a reveal token for it. The
//! coordinator draws cards from the agreed deck, collects those tokens and
//! asks the recipient's session to peek.

use super::{
    actor::Room,
    errors::{RoomError, RoomResult},
    occupant::Occupant,
};
use crate::{
    crypto::{DealtCardRecord, GameSession, PlayerSession},
    game::Card,
};
use futures_util::future::try_join_all;
use rand::seq::IndexedRandom;
use std::sync::Arc;

/// Deals cards out of a room's agreed shuffled deck.
pub struct CardDealCoordinator<'a> {
    room: &'a Room,
}

/// Everything a deal needs, captured under the room lock
struct Draw {
    game: Arc<GameSession>,
    cards: Vec<String>,
    quorum: Vec<Arc<PlayerSession>>,
}

impl Room {
    pub fn dealer(&self) -> CardDealCoordinator<'_> {
        CardDealCoordinator { room: self }
    }
}

impl CardDealCoordinator<'_> {
    /// Deal `count` cards to one occupant
    ///
    /// Draws the next cards, collects a reveal token for each from every
    /// other participant, then decodes them with a single peek by the
    /// recipient. The deck cursor is never rewound: a failure leaves the
    /// drawn cards burned and callers abort the hand.
    ///
    /// # Arguments
    ///
    /// * `recipient` - Occupant the cards are revealed to
    /// * `count` - Number of cards to draw
    ///
    /// # Returns
    ///
    /// * `RoomResult<Vec<Card>>` - Decoded cards in draw order
    pub async fn deal_to(&self, recipient: &Arc<Occupant>, count: usize) -> RoomResult<Vec<Card>> {
        let session = recipient
            .session()
            .ok_or_else(|| RoomError::NoSession(recipient.id().to_string()))?;
        let draw = self.draw(count, recipient.id(), &session.game_id).await?;

        let others: Vec<&Arc<PlayerSession>> = draw
            .quorum
            .iter()
            .filter(|other| other.game_user_id != session.game_user_id)
            .collect();

        let tokens = try_join_all(others.iter().map(|other| other.reveal_tokens(&draw.cards)))
            .await
            .map_err(|e| RoomError::RevealFailed(e.to_string()))?;

        let mut records = Vec::with_capacity(draw.cards.len());
        for card in &draw.cards {
            let mut reveal_token = Vec::with_capacity(tokens.len());
            for (other, by_card) in others.iter().zip(&tokens) {
                let token = by_card.get(card).cloned().ok_or_else(|| {
                    RoomError::RevealFailed(format!(
                        "no token for {} from {}",
                        card, other.user_id
                    ))
                })?;
                reveal_token.push(token);
            }
            records.push(DealtCardRecord {
                card: card.clone(),
                reveal_token,
            });
        }

        let decoded = session
            .peek(&records)
            .await
            .map_err(|e| RoomError::RevealFailed(e.to_string()))?;

        let cards = draw
            .cards
            .iter()
            .map(|masked| {
                decoded
                    .get(masked)
                    .and_then(|initial| draw.game.card_for(initial))
                    .ok_or_else(|| RoomError::RevealFailed(format!("undecoded card {}", masked)))
            })
            .collect::<RoomResult<Vec<Card>>>()?;

        log::debug!(
            "Room {}: dealt {} cards to {} with {} tokens each",
            self.room.id(),
            cards.len(),
            recipient.id(),
            others.len()
        );
        recipient.record_reveals(records);
        Ok(cards)
    }

    /// Deal `count` community cards
    ///
    /// A random seated participant of the current hand acts as the
    /// revealing party.
    pub async fn deal_public(&self, count: usize) -> RoomResult<Vec<Card>> {
        let revealer = self.pick_revealer().await.ok_or(RoomError::NoOccupants)?;
        self.deal_to(&revealer, count).await
    }

    async fn pick_revealer(&self) -> Option<Arc<Occupant>> {
        let state = self.room.state.lock().await;
        let game_id = state.session.as_ref()?.game_id.clone();
        let candidates: Vec<Arc<Occupant>> = state
            .seated()
            .filter(|o| o.session().is_some_and(|s| s.game_id == game_id))
            .cloned()
            .collect();
        choose(&candidates)
    }

    /// Take the next `count` cards off the deck and snapshot the quorum
    async fn draw(&self, count: usize, recipient: &str, game_id: &str) -> RoomResult<Draw> {
        let mut state = self.room.state.lock().await;
        let game = match &state.session {
            Some(game) if game.game_id == game_id => Arc::clone(game),
            _ => return Err(RoomError::NoSession(recipient.to_string())),
        };

        let remaining = game.shuffled.len().saturating_sub(state.deck_pos);
        if count > remaining {
            return Err(RoomError::DeckExhausted {
                requested: count,
                remaining,
            });
        }
        let start = state.deck_pos;
        state.deck_pos += count;
        let cards = game.shuffled[start..start + count].to_vec();

        let quorum = state
            .seated()
            .filter_map(|o| o.session())
            .filter(|s| s.game_id == game.game_id)
            .collect();

        Ok(Draw {
            game,
            cards,
            quorum,
        })
    }
}

fn choose(candidates: &[Arc<Occupant>]) -> Option<Arc<Occupant>> {
    candidates.choose(&mut rand::rng()).cloned()
}
