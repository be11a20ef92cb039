//! Shared fixtures for room integration tests.
//!
//! `MockCrypto` plays the card-crypto service with a rigged deck: initial
//! card `c{i}` masks to `m{i}`, shuffles are the identity, and a peek maps
//! `m{i}` back to `c{i}`. Deck position `i` therefore holds `deck[i]`.

#![allow(dead_code)]

use async_trait::async_trait;
use mental_poker::{
    crypto::{
        AggregatePlayer, CardCrypto, CryptoError, CryptoResult, DealtCardRecord, InitialCard,
        InitializedDeck, KeyProof, MaskedCard, PedersenProof, PlayerKeys, RevealToken,
        SetupRequest, ShuffledDeck, VerifyShuffleRequest,
    },
    game::{Card, ClassicCard, StandardEvaluator, Suit},
    ledger::{LedgerError, LedgerResult, Settlement, SettlementLedger},
    room::{
        ChannelConnection, ClientEnd, Message, Occupant, PresenceAction, RoomConfig,
        RoomRegistry, SettlementPolicy, serve_occupant,
    },
};
use std::{
    collections::HashMap,
    sync::{
        Arc, Mutex,
        atomic::{AtomicBool, AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::mpsc;

/// One `compute_reveal_token` call
#[derive(Debug, Clone)]
pub struct TokenCall {
    pub game_user_id: String,
    pub cards: Vec<String>,
}

/// One `peek_cards` call
#[derive(Debug, Clone)]
pub struct PeekCall {
    pub game_user_id: String,
    pub cards: Vec<String>,
    pub tokens_per_card: Vec<usize>,
}

#[derive(Default)]
pub struct MockCrypto {
    deck: Vec<Card>,
    /// game_user_id to user_id
    players: Mutex<HashMap<String, String>>,
    token_calls: Mutex<Vec<TokenCall>>,
    peek_calls: Mutex<Vec<PeekCall>>,
    clear_calls: AtomicUsize,
    fail_next_token_call: AtomicBool,
    fail_setup: AtomicBool,
}

impl MockCrypto {
    /// Deck starting with `top` in order, followed by the remaining cards
    pub fn rigged(top: &[Card]) -> Arc<Self> {
        let mut deck = top.to_vec();
        for suit in [Suit::Club, Suit::Spade, Suit::Diamond, Suit::Heart] {
            for value in 2..=14 {
                let card = Card(value, suit);
                if !deck.contains(&card) {
                    deck.push(card);
                }
            }
        }
        Arc::new(Self {
            deck,
            ..Default::default()
        })
    }

    pub fn user_of(&self, game_user_id: &str) -> Option<String> {
        self.players.lock().unwrap().get(game_user_id).cloned()
    }

    pub fn token_calls(&self) -> Vec<TokenCall> {
        self.token_calls.lock().unwrap().clone()
    }

    pub fn peek_calls(&self) -> Vec<PeekCall> {
        self.peek_calls.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) -> usize {
        self.clear_calls.load(Ordering::SeqCst)
    }

    pub fn fail_next_token_call(&self) {
        self.fail_next_token_call.store(true, Ordering::SeqCst);
    }

    pub fn fail_setup(&self) {
        self.fail_setup.store(true, Ordering::SeqCst);
    }

    pub fn reset_calls(&self) {
        self.token_calls.lock().unwrap().clear();
        self.peek_calls.lock().unwrap().clear();
    }
}

fn service_error(body: &str) -> CryptoError {
    CryptoError::Service {
        status: 500,
        body: body.to_string(),
    }
}

#[async_trait]
impl CardCrypto for MockCrypto {
    async fn initialize_deck(&self) -> CryptoResult<InitializedDeck> {
        if self.fail_setup.swap(false, Ordering::SeqCst) {
            return Err(service_error("deck unavailable"));
        }
        Ok(InitializedDeck {
            cards: self
                .deck
                .iter()
                .enumerate()
                .map(|(i, card)| InitialCard {
                    card: format!("c{i}"),
                    classic_card: ClassicCard::from(*card),
                })
                .collect(),
            seed_hex: "5eed".to_string(),
        })
    }

    async fn setup_player(&self, request: &SetupRequest) -> CryptoResult<PlayerKeys> {
        self.players
            .lock()
            .unwrap()
            .insert(request.game_user_id.clone(), request.user_id.clone());
        Ok(PlayerKeys {
            user_public_key: format!("pk-{}", request.game_user_id),
            user_key_proof: KeyProof::default(),
        })
    }

    async fn compute_aggregate_key(
        &self,
        players: &[AggregatePlayer],
        _seed_hex: &str,
    ) -> CryptoResult<String> {
        Ok(format!("joined-{}", players.len()))
    }

    async fn mask(
        &self,
        _seed_hex: &str,
        cards: &[String],
        _joined_key: &str,
    ) -> CryptoResult<Vec<MaskedCard>> {
        Ok(cards
            .iter()
            .map(|card| MaskedCard {
                masked_card: card.replacen('c', "m", 1),
                proof: PedersenProof::default(),
            })
            .collect())
    }

    async fn shuffle(
        &self,
        _seed_hex: &str,
        cards: &[String],
        _joined_key: &str,
    ) -> CryptoResult<ShuffledDeck> {
        Ok(ShuffledDeck {
            cards: cards.to_vec(),
            shuffle_proof: "identity".to_string(),
        })
    }

    async fn verify_shuffle(&self, request: &VerifyShuffleRequest) -> CryptoResult<()> {
        if request.origin_cards.len() != request.shuffled_cards.len() {
            return Err(service_error("length mismatch"));
        }
        Ok(())
    }

    async fn compute_reveal_token(
        &self,
        game_user_id: &str,
        _seed_hex: &str,
        cards: &[String],
    ) -> CryptoResult<HashMap<String, RevealToken>> {
        self.token_calls.lock().unwrap().push(TokenCall {
            game_user_id: game_user_id.to_string(),
            cards: cards.to_vec(),
        });
        if self.fail_next_token_call.swap(false, Ordering::SeqCst) {
            return Err(service_error("token service down"));
        }
        Ok(cards
            .iter()
            .map(|card| {
                (
                    card.clone(),
                    RevealToken {
                        token: format!("{game_user_id}:{card}"),
                        proof: PedersenProof::default(),
                        public_key: format!("pk-{game_user_id}"),
                    },
                )
            })
            .collect())
    }

    async fn peek_cards(
        &self,
        game_user_id: &str,
        _seed_hex: &str,
        records: &[DealtCardRecord],
    ) -> CryptoResult<HashMap<String, String>> {
        self.peek_calls.lock().unwrap().push(PeekCall {
            game_user_id: game_user_id.to_string(),
            cards: records.iter().map(|r| r.card.clone()).collect(),
            tokens_per_card: records.iter().map(|r| r.reveal_token.len()).collect(),
        });
        Ok(records
            .iter()
            .map(|r| (r.card.clone(), r.card.replacen('m', "c", 1)))
            .collect())
    }

    async fn clear_player(
        &self,
        _user_id: &str,
        _game_id: &str,
        _game_user_id: &str,
    ) -> CryptoResult<()> {
        self.clear_calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Ledger that keeps every settlement it receives
#[derive(Default)]
pub struct RecordingLedger {
    settlements: Mutex<Vec<Settlement>>,
    attempts: AtomicUsize,
    reject: AtomicBool,
}

impl RecordingLedger {
    pub fn settlements(&self) -> Vec<Settlement> {
        self.settlements.lock().unwrap().clone()
    }

    /// Calls to `end_game`, accepted or not
    pub fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }

    /// Answer every later `end_game` with a rejection
    pub fn reject_all(&self) {
        self.reject.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SettlementLedger for RecordingLedger {
    async fn end_game(&self, settlement: &Settlement) -> LedgerResult<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        if self.reject.load(Ordering::SeqCst) {
            return Err(LedgerError::Rejected {
                status: 503,
                body: "ledger unavailable".to_string(),
            });
        }
        self.settlements.lock().unwrap().push(settlement.clone());
        Ok(())
    }
}

/// Configuration for driving hands by hand from tests
pub fn test_config(max_seats: usize) -> RoomConfig {
    RoomConfig {
        max_seats,
        small_blind: 500,
        big_blind: 1000,
        action_timeout_secs: 30,
        idle_interval_secs: 3600,
        auto_start_players: 0,
        default_buy_in: 100_000,
        settlement: SettlementPolicy::HeadsUp,
    }
}

pub fn registry(
    crypto: &Arc<MockCrypto>,
    ledger: &Arc<RecordingLedger>,
    config: RoomConfig,
) -> Arc<RoomRegistry> {
    RoomRegistry::new(
        Arc::clone(crypto) as Arc<dyn CardCrypto>,
        Arc::new(StandardEvaluator),
        Arc::clone(ledger) as Arc<dyn SettlementLedger>,
        config,
    )
}

/// How a scripted client answers its prompts
#[derive(Debug, Clone, Copy)]
pub enum Strategy {
    /// Always send this amount
    Fixed(i64),
    /// Match the table bet
    Call,
    /// Never answer
    Silent,
}

/// In-memory player that answers prompts for its own seat.
///
/// Every message it receives is forwarded to `inbox`. Dropping it closes
/// the connection.
pub struct ScriptedClient {
    pub id: String,
    pub inbox: mpsc::UnboundedReceiver<Message>,
    outbox: mpsc::UnboundedSender<Message>,
}

impl ScriptedClient {
    pub fn send(&self, message: Message) {
        let _ = self.outbox.send(message);
    }

    /// Wait for the first message matching `pred`, skipping others
    pub async fn wait_for(
        &mut self,
        timeout: Duration,
        pred: impl Fn(&Message) -> bool,
    ) -> Option<Message> {
        tokio::time::timeout(timeout, async {
            while let Some(message) = self.inbox.recv().await {
                if pred(&message) {
                    return Some(message);
                }
            }
            None
        })
        .await
        .ok()
        .flatten()
    }

    pub async fn wait_presence(
        &mut self,
        timeout: Duration,
        action: PresenceAction,
    ) -> Option<Message> {
        self.wait_for(timeout, |m| m.as_presence().is_some_and(|p| p.action == action))
            .await
    }
}

/// Run a scripted client on `end` that plays `seat` with `strategy`
pub fn script(id: &str, seat: usize, strategy: Strategy, mut end: ClientEnd) -> ScriptedClient {
    let (inbox_tx, inbox) = mpsc::unbounded_channel();
    let (outbox, mut outbox_rx) = mpsc::unbounded_channel::<Message>();
    let me = id.to_string();

    tokio::spawn(async move {
        let mut my_bet = 0;
        loop {
            let message = tokio::select! {
                received = end.recv() => match received {
                    Some(message) => message,
                    None => break,
                },
                out = outbox_rx.recv() => match out {
                    Some(out) => {
                        end.send(out);
                        continue;
                    }
                    None => break,
                },
            };

            if let Some(presence) = message.as_presence() {
                match presence.action {
                    PresenceAction::Button
                    | PresenceAction::Flop
                    | PresenceAction::Turn
                    | PresenceAction::River => my_bet = 0,
                    PresenceAction::Bet if presence.from == me => {
                        my_bet = presence
                            .payload
                            .split(',')
                            .nth(1)
                            .and_then(|b| b.parse().ok())
                            .unwrap_or(my_bet);
                    }
                    PresenceAction::Action => {
                        let mut parts = presence.payload.split(',');
                        let pos: usize = parts.next().and_then(|p| p.parse().ok()).unwrap_or(0);
                        let bet: i64 = parts.next().and_then(|b| b.parse().ok()).unwrap_or(0);
                        if pos == seat {
                            let amount = match strategy {
                                Strategy::Fixed(amount) => Some(amount),
                                Strategy::Call => Some((bet - my_bet).max(0)),
                                Strategy::Silent => None,
                            };
                            if let Some(amount) = amount {
                                end.send(Message::action(&me, amount));
                            }
                        }
                    }
                    _ => {}
                }
            }
            let _ = inbox_tx.send(message);
        }
    });

    ScriptedClient {
        id: id.to_string(),
        inbox,
        outbox,
    }
}

/// Connect a player, start its dispatch loop and script its client
pub fn connect(
    registry: &Arc<RoomRegistry>,
    id: &str,
    seat: usize,
    strategy: Strategy,
) -> (Arc<Occupant>, ScriptedClient) {
    let (conn, end) = ChannelConnection::pair();
    let occupant = Occupant::new(id, id.to_uppercase(), conn);
    tokio::spawn(serve_occupant(
        Arc::clone(&occupant),
        Arc::clone(registry),
        occupant.generation(),
    ));
    (occupant, script(id, seat, strategy, end))
}

pub const TIMEOUT: Duration = Duration::from_secs(5);
