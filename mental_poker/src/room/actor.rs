//! Room: seat table, hand lifecycle and scheduling task.

use super::{
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    messages::{Message, PresenceAction, RoomView},
    occupant::Occupant,
    registry::RoomRegistry,
};
use crate::{
    constants::{DEFAULT_SEATS, HOLE_CARDS, MAX_SEATS},
    crypto::{self, CardCrypto, GameSession},
    game::{
        BetAction, Card, Chips, HandCategory, HandEvaluator, HandPot, entities::join_cards,
    },
    ledger::SettlementLedger,
};
use std::{
    sync::{
        Arc, Weak,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex, mpsc, watch};

/// Stages of one hand, in order. Any stage may jump to `Showdown` once
/// at most one seat is still contesting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandStage {
    Setup,
    Preflop,
    Flop,
    Turn,
    River,
    Showdown,
    Settled,
}

/// Summary of a finished hand
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HandReport {
    pub game_id: String,
    pub button: usize,
    pub small_blind: usize,
    pub big_blind: usize,
    pub board: Vec<Card>,
    pub pots: Vec<HandPot>,
    /// Chips won per seat, indexed by seat position - 1
    pub winnings: Vec<Chips>,
    /// Why the hand jumped to showdown early, if a deal failed
    pub aborted: Option<String>,
    /// Whether the hand sequence ended and was reported to the ledger
    pub settled: bool,
}

/// Seat table and per-hand counters, guarded by the room lock
pub(super) struct RoomState {
    pub(super) seats: Vec<Option<Arc<Occupant>>>,
    /// Chips committed this hand, per seat
    pub(super) committed: Vec<Chips>,
    /// Table bet level on the current street
    pub(super) bet: Chips,
    pub(super) board: Vec<Card>,
    pub(super) pots: Vec<Chips>,
    pub(super) button: usize,
    pub(super) occupied: usize,
    /// Seats still contesting the hand
    pub(super) remain: usize,
    pub(super) allin: usize,
    pub(super) session: Option<Arc<GameSession>>,
    /// Next undealt position in the shuffled deck
    pub(super) deck_pos: usize,
    pub(super) closed: bool,
}

impl RoomState {
    fn new(seats: usize) -> Self {
        Self {
            seats: vec![None; seats],
            committed: vec![0; seats],
            bet: 0,
            board: Vec::new(),
            pots: Vec::new(),
            button: 0,
            occupied: 0,
            remain: 0,
            allin: 0,
            session: None,
            deck_pos: 0,
            closed: false,
        }
    }

    pub(super) fn capacity(&self) -> usize {
        self.seats.len()
    }

    pub(super) fn seated(&self) -> impl Iterator<Item = &Arc<Occupant>> {
        self.seats.iter().flatten()
    }

    /// Occupant at a 1-based seat position
    pub(super) fn occupant_at(&self, pos: usize) -> Option<&Arc<Occupant>> {
        pos.checked_sub(1)
            .and_then(|idx| self.seats.get(idx))
            .and_then(Option::as_ref)
    }

    pub(super) fn is_seated(&self, occupant: &Occupant) -> bool {
        self.occupant_at(occupant.pos())
            .is_some_and(|seated| std::ptr::eq(Arc::as_ptr(seated), occupant))
    }

    /// First seat clockwise after `after` (1-based, 0 for "before seat 1")
    /// whose occupant matches `pred`. Wraps around to `after` itself.
    pub(super) fn next_seat(
        &self,
        after: usize,
        pred: impl Fn(&Occupant) -> bool,
    ) -> Option<usize> {
        let cap = self.capacity();
        (1..=cap)
            .map(|step| (after + step - 1) % cap + 1)
            .find(|pos| self.occupant_at(*pos).is_some_and(|o| pred(o)))
    }
}

/// A table running a sequence of hands among its occupants.
pub struct Room {
    id: String,
    config: RoomConfig,
    pub(super) state: Mutex<RoomState>,
    /// Mirror of `RoomState::occupied` readable without the room lock
    occupied: AtomicUsize,
    /// Serializes hands
    hand_lock: Mutex<()>,
    /// Set once at most one seat is still contesting the current hand
    pub(super) abort: watch::Sender<bool>,
    shutdown: watch::Sender<bool>,
    start: mpsc::Sender<()>,
    pub(super) crypto: Arc<dyn CardCrypto>,
    pub(super) evaluator: Arc<dyn HandEvaluator>,
    pub(super) ledger: Arc<dyn SettlementLedger>,
    registry: Weak<RoomRegistry>,
}

impl Room {
    /// Create a room and spawn its scheduling task
    ///
    /// Must be called from within a Tokio runtime. The task triggers a hand
    /// every idle interval or on [`Room::start_now`], and exits once the
    /// room is torn down or dropped.
    ///
    /// # Arguments
    ///
    /// * `id` - Room identifier
    /// * `config` - Room configuration; an out-of-range seat count falls back to the default
    /// * `crypto` - Card-crypto collaborator
    /// * `evaluator` - Hand-strength evaluator
    /// * `ledger` - Settlement ledger
    /// * `registry` - Registry to leave when the room empties
    pub fn new(
        id: impl Into<String>,
        mut config: RoomConfig,
        crypto: Arc<dyn CardCrypto>,
        evaluator: Arc<dyn HandEvaluator>,
        ledger: Arc<dyn SettlementLedger>,
        registry: Weak<RoomRegistry>,
    ) -> Arc<Self> {
        let id = id.into();
        if config.max_seats == 0 || config.max_seats > MAX_SEATS {
            log::warn!(
                "Room {}: invalid seat count {}, using {}",
                id,
                config.max_seats,
                DEFAULT_SEATS
            );
            config.max_seats = DEFAULT_SEATS;
        }

        let (start_tx, start_rx) = mpsc::channel(1);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let (abort_tx, _) = watch::channel(false);
        let idle = config.idle_interval();

        let room = Arc::new(Self {
            state: Mutex::new(RoomState::new(config.max_seats)),
            id,
            config,
            occupied: AtomicUsize::new(0),
            hand_lock: Mutex::new(()),
            abort: abort_tx,
            shutdown: shutdown_tx,
            start: start_tx,
            crypto,
            evaluator,
            ledger,
            registry,
        });

        tokio::spawn(run_scheduler(
            Arc::downgrade(&room),
            start_rx,
            shutdown_rx,
            idle,
        ));
        log::info!("Room {} created ({} seats)", room.id, room.config.max_seats);
        room
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Occupied seats, read without taking the room lock
    pub fn occupied(&self) -> usize {
        self.occupied.load(Ordering::SeqCst)
    }

    pub fn has_free_seat(&self) -> bool {
        self.occupied() < self.config.max_seats && !*self.shutdown.borrow()
    }

    pub fn is_closed(&self) -> bool {
        *self.shutdown.borrow()
    }

    /// Ask the scheduling task to start a hand now
    pub fn start_now(&self) -> bool {
        self.start.try_send(()).is_ok()
    }

    pub async fn occupant(&self, id: &str) -> Option<Arc<Occupant>> {
        let state = self.state.lock().await;
        state.seated().find(|o| o.id() == id).cloned()
    }

    pub async fn occupants(&self) -> Vec<Arc<Occupant>> {
        let state = self.state.lock().await;
        state.seated().cloned().collect()
    }

    /// Public view of the room without hole cards
    pub async fn snapshot(&self) -> RoomView {
        let state = self.state.lock().await;
        self.view(&state, None, false)
    }

    pub(super) fn view(
        &self,
        state: &RoomState,
        viewer: Option<&str>,
        reveal_all: bool,
    ) -> RoomView {
        RoomView {
            id: self.id.clone(),
            small_blind: self.config.small_blind,
            big_blind: self.config.big_blind,
            max_seats: state.capacity(),
            occupied: state.occupied,
            timeout_secs: self.config.action_timeout_secs,
            button: state.button,
            bet: state.bet,
            board: state.board.clone(),
            pots: state.pots.clone(),
            committed: state.committed.clone(),
            occupants: state
                .seats
                .iter()
                .map(|seat| {
                    seat.as_ref()
                        .map(|o| o.view(reveal_all || viewer == Some(o.id())))
                })
                .collect(),
        }
    }

    /// Seat an occupant
    ///
    /// Joining a room the occupant already sits in only re-sends the room
    /// state. An occupant seated elsewhere leaves that room first.
    ///
    /// # Arguments
    ///
    /// * `occupant` - Player to seat
    /// * `buy_in` - Starting stack; zero or less uses the configured default
    ///
    /// # Returns
    ///
    /// * `RoomResult<usize>` - Seat position
    pub async fn join(
        self: &Arc<Self>,
        occupant: &Arc<Occupant>,
        buy_in: Chips,
    ) -> RoomResult<usize> {
        if let Some(current) = occupant.room() {
            if !Arc::ptr_eq(&current, self) {
                occupant.leave().await;
            }
        }

        let (pos, occupied, state_view, joined) = {
            let mut state = self.state.lock().await;
            if state.closed {
                return Err(RoomError::RoomClosed);
            }

            let existing = state
                .seated()
                .find(|o| o.id() == occupant.id())
                .map(|o| o.pos());
            match existing {
                Some(pos) => (
                    pos,
                    state.occupied,
                    self.view(&state, Some(occupant.id()), false),
                    false,
                ),
                None => {
                    let Some(idx) = state.seats.iter().position(Option::is_none) else {
                        return Err(RoomError::RoomFull);
                    };
                    {
                        let mut seat = occupant.state();
                        seat.reset_hand();
                        seat.session = None;
                        seat.chips = if buy_in > 0 {
                            buy_in
                        } else {
                            self.config.default_buy_in
                        };
                        seat.pos = idx + 1;
                    }
                    state.seats[idx] = Some(Arc::clone(occupant));
                    state.occupied += 1;
                    self.occupied.store(state.occupied, Ordering::SeqCst);
                    occupant.set_room(Arc::downgrade(self));
                    (
                        idx + 1,
                        state.occupied,
                        self.view(&state, Some(occupant.id()), false),
                        true,
                    )
                }
            }
        };

        if joined {
            log::info!(
                "Room {}: {} ({}) joined seat {}",
                self.id,
                occupant.name(),
                occupant.id(),
                pos
            );
            if self.config.auto_start_players > 0 && occupied >= self.config.auto_start_players {
                self.start_now();
            }
            let announce = Message::presence(&self.id, PresenceAction::Join, occupant.id())
                .with_occupant(occupant.view(false));
            self.broadcast_except(&announce, occupant).await;
        }

        let snapshot = Message::presence(&self.id, PresenceAction::State, "").with_room(state_view);
        if let Err(e) = occupant.send(&snapshot).await {
            log::debug!("Room {}: failed to send state to {}: {}", self.id, occupant.id(), e);
        }
        Ok(pos)
    }

    /// Free an occupant's seat.
    ///
    /// Decrements the contesting count when the occupant was still in the
    /// hand and raises the abort signal once at most one seat contests.
    /// Tears the room down when the last seat empties.
    pub(super) async fn remove_occupant(&self, occupant: &Occupant) {
        let emptied = {
            let mut state = self.state.lock().await;
            if !state.is_seated(occupant) {
                return;
            }
            let pos = occupant.pos();
            state.seats[pos - 1] = None;
            state.occupied -= 1;
            self.occupied.store(state.occupied, Ordering::SeqCst);

            let (in_hand, all_in) = {
                let mut seat = occupant.state();
                seat.pos = 0;
                let all_in = seat.action == Some(BetAction::AllIn);
                (std::mem::take(&mut seat.in_hand), all_in)
            };
            if in_hand {
                if all_in {
                    state.allin = state.allin.saturating_sub(1);
                }
                state.remain = state.remain.saturating_sub(1);
                if state.remain <= 1 {
                    self.abort.send_replace(true);
                }
            }

            if state.occupied == 0 {
                state.closed = true;
            }
            state.closed
        };

        if emptied {
            self.teardown().await;
        }
    }

    async fn teardown(&self) {
        self.shutdown.send_replace(true);
        if let Some(registry) = self.registry.upgrade() {
            registry.remove(self).await;
        }
        log::info!("Room {} closed", self.id);
    }

    /// Send a message to every seated occupant
    pub async fn broadcast(&self, message: &Message) {
        for occupant in self.occupants().await {
            if let Err(e) = occupant.send(message).await {
                log::debug!("Room {}: failed to send to {}: {}", self.id, occupant.id(), e);
            }
        }
    }

    pub(super) async fn broadcast_except(&self, message: &Message, except: &Occupant) {
        for occupant in self.occupants().await {
            if std::ptr::eq(Arc::as_ptr(&occupant), except) {
                continue;
            }
            if let Err(e) = occupant.send(message).await {
                log::debug!("Room {}: failed to send to {}: {}", self.id, occupant.id(), e);
            }
        }
    }

    /// Send a message to one occupant, logging failures
    pub(super) async fn send_to(&self, occupant: &Occupant, message: &Message) {
        if let Err(e) = occupant.send(message).await {
            log::debug!("Room {}: failed to send to {}: {}", self.id, occupant.id(), e);
        }
    }

    /// Seated occupants still contesting the hand, in seat order
    pub(super) async fn contesting(&self) -> Vec<Arc<Occupant>> {
        let state = self.state.lock().await;
        state
            .seated()
            .filter(|o| o.state().in_hand)
            .cloned()
            .collect()
    }

    /// Play one hand
    ///
    /// Removes occupants who cannot cover the big blind, then runs the hand
    /// state machine from setup to settlement. Hands never overlap.
    ///
    /// # Returns
    ///
    /// * `Ok(None)` - Fewer than two occupants, nothing played
    /// * `Ok(Some(report))` - Hand finished, possibly cut short by a failed deal
    /// * `Err(RoomError::Setup)` - The crypto session could not be established
    pub async fn start_hand(&self) -> RoomResult<Option<HandReport>> {
        let _hand = self.hand_lock.lock().await;

        let broke: Vec<Arc<Occupant>> = {
            let state = self.state.lock().await;
            if state.closed {
                return Ok(None);
            }
            state
                .seated()
                .filter(|o| o.chips() < self.config.big_blind)
                .cloned()
                .collect()
        };
        for occupant in broke {
            log::info!(
                "Room {}: removing {} with {} chips",
                self.id,
                occupant.id(),
                occupant.chips()
            );
            occupant.leave().await;
        }

        let participants: Vec<Arc<Occupant>> = {
            let state = self.state.lock().await;
            if state.closed || state.occupied < 2 {
                return Ok(None);
            }
            state.seated().cloned().collect()
        };

        let mut report = HandReport::default();
        let mut stage = HandStage::Setup;
        loop {
            log::debug!("Room {}: {:?}", self.id, stage);
            stage = match stage {
                HandStage::Setup => self.setup_hand(&participants, &mut report).await?,
                HandStage::Preflop => self.play_preflop(&mut report).await,
                HandStage::Flop => {
                    self.play_street(&mut report, 3, PresenceAction::Flop, HandStage::Turn)
                        .await
                }
                HandStage::Turn => {
                    self.play_street(&mut report, 1, PresenceAction::Turn, HandStage::River)
                        .await
                }
                HandStage::River => {
                    self.play_street(&mut report, 1, PresenceAction::River, HandStage::Showdown)
                        .await
                }
                HandStage::Showdown => {
                    self.showdown(&mut report).await;
                    HandStage::Settled
                }
                HandStage::Settled => {
                    report.settled = self.check_settlement(&report.game_id).await;
                    break;
                }
            };
        }

        log::info!(
            "Room {}: hand {} finished, pots {:?}",
            self.id,
            report.game_id,
            report.pots.iter().map(|p| p.amount).collect::<Vec<_>>()
        );
        Ok(Some(report))
    }

    async fn setup_hand(
        &self,
        participants: &[Arc<Occupant>],
        report: &mut HandReport,
    ) -> RoomResult<HandStage> {
        let user_ids: Vec<String> = participants.iter().map(|o| o.id().to_string()).collect();
        let (game, sessions) = match crypto::establish(&self.crypto, &user_ids).await {
            Ok(established) => established,
            Err(e) => {
                log::error!("Room {}: game setup failed: {}", self.id, e);
                return Err(RoomError::Setup(e));
            }
        };
        let game = Arc::new(game);
        report.game_id = game.game_id.clone();

        let dealt: Vec<Arc<Occupant>> = {
            let mut state = self.state.lock().await;
            let cap = state.capacity();
            state.committed = vec![0; cap];
            state.bet = 0;
            state.board.clear();
            state.pots.clear();
            state.allin = 0;
            state.deck_pos = 0;
            state.session = Some(Arc::clone(&game));

            for occupant in state.seated() {
                occupant.state().reset_hand();
            }
            let mut remain = 0;
            for (occupant, session) in participants.iter().zip(sessions) {
                if !state.is_seated(occupant) {
                    continue;
                }
                let mut seat = occupant.state();
                seat.session = Some(Arc::new(session));
                seat.in_hand = true;
                remain += 1;
            }
            state.remain = remain;
            self.abort.send_replace(remain <= 1);
            if remain < 2 {
                return Ok(HandStage::Showdown);
            }

            let in_hand = |o: &Occupant| o.state().in_hand;
            let Some(button) = state.next_seat(state.button, in_hand) else {
                return Ok(HandStage::Showdown);
            };
            let small_blind = if remain == 2 {
                button
            } else {
                state.next_seat(button, in_hand).unwrap_or(button)
            };
            let big_blind = state.next_seat(small_blind, in_hand).unwrap_or(small_blind);
            state.button = button;
            report.button = button;
            report.small_blind = small_blind;
            report.big_blind = big_blind;

            state
                .seated()
                .filter(|o| o.state().in_hand)
                .cloned()
                .collect()
        };

        self.broadcast(&Message::presence(
            &self.id,
            PresenceAction::Button,
            report.button.to_string(),
        ))
        .await;

        for occupant in dealt {
            match self.dealer().deal_to(&occupant, HOLE_CARDS).await {
                Ok(cards) => occupant.state().cards = cards,
                Err(RoomError::NoSession(_)) if occupant.pos() == 0 => continue,
                Err(e) => {
                    log::error!("Room {}: dealing hole cards failed: {}", self.id, e);
                    report.aborted = Some(e.to_string());
                    return Ok(HandStage::Showdown);
                }
            }
        }
        Ok(HandStage::Preflop)
    }

    async fn play_preflop(&self, report: &mut HandReport) -> HandStage {
        self.betting(report.small_blind, self.config.small_blind).await;
        self.betting(report.big_blind, self.config.big_blind).await;

        for occupant in self.contesting().await {
            let cards = occupant.cards();
            let message = Message::presence(&self.id, PresenceAction::Preflop, join_cards(&cards));
            self.send_to(&occupant, &message).await;
        }

        let first = report.big_blind % self.config.max_seats + 1;
        self.run_betting_round(first).await;
        self.close_round(HandStage::Flop).await
    }

    async fn play_street(
        &self,
        report: &mut HandReport,
        count: usize,
        action: PresenceAction,
        next: HandStage,
    ) -> HandStage {
        self.reset_street().await;

        let cards = match self.dealer().deal_public(count).await {
            Ok(cards) => cards,
            Err(e) => {
                log::error!("Room {}: dealing {} failed: {}", self.id, action, e);
                report.aborted = Some(e.to_string());
                return HandStage::Showdown;
            }
        };

        let (board, seated) = {
            let mut state = self.state.lock().await;
            state.board.extend(cards.iter().copied());
            (state.board.clone(), state.seated().cloned().collect::<Vec<_>>())
        };
        report.board = board.clone();

        for occupant in seated {
            let payload = {
                let mut seat = occupant.state();
                if seat.in_hand {
                    let mut all = seat.cards.clone();
                    all.extend(board.iter().copied());
                    seat.hand = self.evaluator.evaluate(&all);
                    format!("{},{}", join_cards(&cards), HandCategory::of(seat.hand))
                } else {
                    join_cards(&cards)
                }
            };
            self.send_to(&occupant, &Message::presence(&self.id, action, payload))
                .await;
        }

        self.run_betting_round(0).await;
        self.close_round(next).await
    }

    /// End of a betting round: jump to showdown if the hand is decided,
    /// otherwise publish the pots and move on.
    async fn close_round(&self, next: HandStage) -> HandStage {
        if self.remain().await <= 1 {
            return HandStage::Showdown;
        }
        self.publish_pots().await;
        next
    }

    pub(super) async fn remain(&self) -> usize {
        self.state.lock().await.remain
    }

    pub(super) fn action_timeout(&self) -> Duration {
        self.config.action_timeout()
    }
}

async fn closed(shutdown: &mut watch::Receiver<bool>) {
    let _ = shutdown.wait_for(|closed| *closed).await;
}

async fn run_scheduler(
    room: Weak<Room>,
    mut start: mpsc::Receiver<()>,
    mut shutdown: watch::Receiver<bool>,
    idle: Duration,
) {
    loop {
        tokio::select! {
            _ = closed(&mut shutdown) => break,
            _ = tokio::time::sleep(idle) => {}
            Some(()) = start.recv() => {}
        }

        let Some(room) = room.upgrade() else {
            break;
        };
        match room.start_hand().await {
            Ok(Some(report)) => {
                log::debug!("Room {}: hand {} complete", room.id(), report.game_id);
            }
            Ok(None) => {}
            Err(e) => log::error!("Room {}: hand failed: {}", room.id(), e),
        }
    }
}
