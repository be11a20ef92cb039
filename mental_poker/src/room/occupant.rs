//! One player's connection, mailbox and per-hand state.

use super::{
    actor::Room,
    connection::Connection,
    errors::{ConnectionError, RoomError, RoomResult},
    messages::{Message, OccupantView, PresenceAction},
};
use crate::{
    constants::{ACTION_CAPACITY, MAILBOX_CAPACITY},
    crypto::{DealtCardRecord, PlayerSession},
    game::{BetAction, Card, Chips, HandStrength},
};
use std::{
    sync::{
        Arc, Mutex, MutexGuard, PoisonError, Weak,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc, oneshot, watch};

/// Result of applying one bet intent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BetOutcome {
    pub action: BetAction,
    /// Chips moved from the stack into the pot by this action
    pub committed: Chips,
    /// Whether the table bet level went up
    pub raised: bool,
    /// Occupant's bet for the current street after the action
    pub bet: Chips,
    /// Occupant's stack after the action
    pub chips: Chips,
}

/// Mutable per-occupant game state
#[derive(Debug, Default)]
pub struct OccupantState {
    pub chips: Chips,
    /// Seat position, 1-based; 0 when unseated
    pub pos: usize,
    /// Chips bet on the current street
    pub bet: Chips,
    pub action: Option<BetAction>,
    pub cards: Vec<Card>,
    pub reveals: Vec<DealtCardRecord>,
    pub hand: HandStrength,
    /// Still contesting the current hand
    pub in_hand: bool,
    pub session: Option<Arc<PlayerSession>>,
}

impl OccupantState {
    /// Apply a signed bet intent against the table bet level.
    ///
    /// Negative folds, zero checks, a positive amount calls when it does not
    /// lift this occupant's street bet above `table_bet` and raises
    /// otherwise. An amount above the stack commits the whole stack. An
    /// empty stack after a non-fold action is an all-in.
    pub fn apply_bet(&mut self, amount: Chips, table_bet: &mut Chips) -> BetOutcome {
        let (action, committed, raised) = if amount < 0 {
            self.cards.clear();
            self.hand = 0;
            self.in_hand = false;
            (BetAction::Fold, 0, false)
        } else if amount == 0 {
            (BetAction::Check, 0, false)
        } else {
            let stake = amount.min(self.chips);
            self.chips -= stake;
            self.bet += stake;
            if self.bet <= *table_bet {
                (BetAction::Call, stake, false)
            } else {
                *table_bet = self.bet;
                (BetAction::Raise, stake, true)
            }
        };

        let action = if action != BetAction::Fold && self.chips == 0 {
            BetAction::AllIn
        } else {
            action
        };
        self.action = Some(action);

        BetOutcome {
            action,
            committed,
            raised,
            bet: self.bet,
            chips: self.chips,
        }
    }

    /// Forget everything about the current hand
    pub fn reset_hand(&mut self) {
        self.bet = 0;
        self.action = None;
        self.cards.clear();
        self.reveals.clear();
        self.hand = 0;
        self.in_hand = false;
    }
}

/// Current transport binding
struct Link {
    conn: Arc<dyn Connection>,
    mailbox: Arc<AsyncMutex<mpsc::Receiver<Message>>>,
    cancel: Option<oneshot::Sender<()>>,
    stopped: Arc<AtomicBool>,
    generation: u64,
}

/// A player's session object, one per connection lineage.
pub struct Occupant {
    id: String,
    name: String,
    state: Mutex<OccupantState>,
    link: Mutex<Link>,
    actions_tx: mpsc::Sender<Message>,
    actions_rx: AsyncMutex<mpsc::Receiver<Message>>,
    departed: Notify,
    room: Mutex<Weak<Room>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Occupant {
    /// Create an occupant and start reading from `conn`
    ///
    /// Must be called from within a Tokio runtime.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        conn: Arc<dyn Connection>,
    ) -> Arc<Self> {
        let id = id.into();
        let (mailbox_tx, mailbox_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let stopped = Arc::new(AtomicBool::new(false));
        let (actions_tx, actions_rx) = mpsc::channel(ACTION_CAPACITY);

        spawn_reader(
            id.clone(),
            Arc::clone(&conn),
            mailbox_tx,
            cancel_rx,
            Arc::clone(&stopped),
        );

        Arc::new(Self {
            id,
            name: name.into(),
            state: Mutex::new(OccupantState::default()),
            link: Mutex::new(Link {
                conn,
                mailbox: Arc::new(AsyncMutex::new(mailbox_rx)),
                cancel: Some(cancel_tx),
                stopped,
                generation: 1,
            }),
            actions_tx,
            actions_rx: AsyncMutex::new(actions_rx),
            departed: Notify::new(),
            room: Mutex::new(Weak::new()),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Lock the per-hand state. Never hold the guard across an await.
    pub fn state(&self) -> MutexGuard<'_, OccupantState> {
        lock(&self.state)
    }

    pub fn chips(&self) -> Chips {
        self.state().chips
    }

    pub fn pos(&self) -> usize {
        self.state().pos
    }

    pub fn cards(&self) -> Vec<Card> {
        self.state().cards.clone()
    }

    pub fn reveals(&self) -> Vec<DealtCardRecord> {
        self.state().reveals.clone()
    }

    pub fn session(&self) -> Option<Arc<PlayerSession>> {
        self.state().session.clone()
    }

    /// Room this occupant is seated in, if any
    pub fn room(&self) -> Option<Arc<Room>> {
        lock(&self.room).upgrade()
    }

    pub(crate) fn set_room(&self, room: Weak<Room>) {
        *lock(&self.room) = room;
    }

    /// Connection generation; bumps on every attach
    pub fn generation(&self) -> u64 {
        lock(&self.link).generation
    }

    /// Whether the current read task has halted
    pub fn is_stopped(&self) -> bool {
        lock(&self.link).stopped.load(Ordering::SeqCst)
    }

    pub fn view(&self, reveal_cards: bool) -> OccupantView {
        let state = self.state();
        OccupantView {
            id: self.id.clone(),
            name: self.name.clone(),
            chips: state.chips,
            pos: state.pos,
            bet: state.bet,
            action: state.action,
            cards: if reveal_cards {
                state.cards.clone()
            } else {
                Vec::new()
            },
            hand: if reveal_cards { state.hand } else { 0 },
        }
    }

    /// Replace the connection and restart the read task.
    ///
    /// The previous read task is cancelled and its mailbox closes once
    /// drained, so a reader parked on it gets [`RoomError::Closed`].
    ///
    /// # Returns
    ///
    /// * `u64` - The new connection generation
    pub fn attach_connection(&self, conn: Arc<dyn Connection>) -> u64 {
        let (mailbox_tx, mailbox_rx) = mpsc::channel(MAILBOX_CAPACITY);
        let (cancel_tx, cancel_rx) = oneshot::channel();
        let stopped = Arc::new(AtomicBool::new(false));

        let (previous, generation) = {
            let mut link = lock(&self.link);
            let previous = link.cancel.take();
            link.conn = Arc::clone(&conn);
            link.mailbox = Arc::new(AsyncMutex::new(mailbox_rx));
            link.cancel = Some(cancel_tx);
            link.stopped = Arc::clone(&stopped);
            link.generation += 1;
            (previous, link.generation)
        };
        if let Some(cancel) = previous {
            let _ = cancel.send(());
        }

        spawn_reader(self.id.clone(), conn, mailbox_tx, cancel_rx, stopped);
        generation
    }

    /// Swap in a new connection for a returning player. Seat, stack,
    /// cards and reveal history are untouched.
    pub fn reconnect(&self, conn: Arc<dyn Connection>) -> u64 {
        let generation = self.attach_connection(conn);
        log::info!(
            "Occupant {} reconnected (generation {})",
            self.id,
            generation
        );
        generation
    }

    /// Next message from the mailbox
    ///
    /// # Arguments
    ///
    /// * `timeout` - How long to wait; zero waits indefinitely
    ///
    /// # Returns
    ///
    /// * `RoomResult<Message>` - `Timeout` when nothing arrived in time,
    ///   `Closed` once the mailbox is drained and its read task has halted
    pub async fn next_message(&self, timeout: Duration) -> RoomResult<Message> {
        let mailbox = Arc::clone(&lock(&self.link).mailbox);
        let mut mailbox = mailbox.lock().await;
        let next = if timeout.is_zero() {
            mailbox.recv().await
        } else {
            tokio::time::timeout(timeout, mailbox.recv())
                .await
                .map_err(|_| RoomError::Timeout)?
        };
        next.ok_or(RoomError::Closed)
    }

    /// Queue a player decision for the next action request. Returns false
    /// when one is already pending.
    pub fn submit_action(&self, message: Message) -> bool {
        match self.actions_tx.try_send(message) {
            Ok(()) => true,
            Err(_) => {
                log::debug!("Occupant {}: action already pending, dropped", self.id);
                false
            }
        }
    }

    /// Drop decisions sent before the occupant was prompted
    pub(crate) fn clear_pending_actions(&self) {
        if let Ok(mut actions) = self.actions_rx.try_lock() {
            while actions.try_recv().is_ok() {}
        }
    }

    /// Wait for a player decision
    ///
    /// Returns `None` on timeout, when `abort` flips to true, or when this
    /// occupant leaves. Callers treat `None` as a fold.
    ///
    /// # Arguments
    ///
    /// * `timeout` - How long to wait; zero waits indefinitely
    /// * `abort` - Room-wide hand abort signal
    pub async fn request_action(
        &self,
        timeout: Duration,
        mut abort: watch::Receiver<bool>,
    ) -> Option<Message> {
        let mut actions = self.actions_rx.lock().await;
        let departed = self.departed.notified();
        tokio::pin!(departed);
        departed.as_mut().enable();

        if self.pos() == 0 {
            return None;
        }

        let deadline = async {
            if timeout.is_zero() {
                std::future::pending::<()>().await
            } else {
                tokio::time::sleep(timeout).await
            }
        };

        tokio::select! {
            message = actions.recv() => message,
            _ = aborted(&mut abort) => None,
            _ = &mut departed => None,
            _ = deadline => {
                log::debug!("Occupant {}: action timed out", self.id);
                None
            }
        }
    }

    /// Apply a bet intent; see [`OccupantState::apply_bet`]
    pub fn apply_bet(&self, amount: Chips, table_bet: &mut Chips) -> BetOutcome {
        self.state().apply_bet(amount, table_bet)
    }

    pub(crate) fn record_reveals(&self, records: Vec<DealtCardRecord>) {
        self.state().reveals.extend(records);
    }

    /// Send a message over the current connection
    pub async fn send(&self, message: &Message) -> Result<(), ConnectionError> {
        let conn = Arc::clone(&lock(&self.link).conn);
        conn.send(message).await
    }

    /// Leave the current room.
    ///
    /// Idempotent: only the first call after a join has any effect. Frees
    /// the seat, forfeits anything committed this hand, wakes a pending
    /// action request and clears the crypto session.
    pub async fn leave(&self) {
        let room = std::mem::take(&mut *lock(&self.room)).upgrade();
        let Some(room) = room else {
            return;
        };

        let view = self.view(false);
        room.broadcast(
            &Message::presence(room.id(), PresenceAction::Leave, self.id.clone())
                .with_occupant(view),
        )
        .await;
        room.remove_occupant(self).await;

        let session = {
            let mut state = self.state();
            state.reset_hand();
            state.pos = 0;
            state.session.take()
        };
        self.departed.notify_waiters();

        if let Some(session) = session {
            if let Err(e) = session.clear().await {
                log::warn!("Occupant {}: failed to clear crypto session: {}", self.id, e);
            }
        }
        log::info!("Occupant {} left room {}", self.id, room.id());
    }
}

async fn aborted(abort: &mut watch::Receiver<bool>) {
    let _ = abort.wait_for(|aborted| *aborted).await;
}

fn spawn_reader(
    id: String,
    conn: Arc<dyn Connection>,
    mailbox: mpsc::Sender<Message>,
    mut cancel: oneshot::Receiver<()>,
    stopped: Arc<AtomicBool>,
) {
    tokio::spawn(async move {
        loop {
            let next = tokio::select! {
                _ = &mut cancel => break,
                next = conn.recv() => next,
            };
            match next {
                Ok(Some(message)) => match mailbox.try_send(message) {
                    Ok(()) => {}
                    Err(mpsc::error::TrySendError::Full(_)) => {
                        log::warn!("Occupant {}: mailbox full, message dropped", id);
                    }
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                },
                Ok(None) => {
                    log::debug!("Occupant {}: connection closed", id);
                    break;
                }
                Err(e) => {
                    log::warn!("Occupant {}: read failed: {}", id, e);
                    break;
                }
            }
        }
        stopped.store(true, Ordering::SeqCst);
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::room::connection::ChannelConnection;
    use std::time::Instant;

    fn state_with(chips: Chips) -> OccupantState {
        OccupantState {
            chips,
            pos: 1,
            in_hand: true,
            ..OccupantState::default()
        }
    }

    async fn wait_stopped(occupant: &Occupant) {
        for _ in 0..200 {
            if occupant.is_stopped() {
                return;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        panic!("read task never stopped");
    }

    #[test]
    fn test_apply_bet_check_and_fold() {
        let mut table_bet = 1000;
        let mut state = state_with(5000);
        state.cards = vec![Card(14, crate::game::Suit::Spade)];

        let outcome = state.apply_bet(0, &mut table_bet);
        assert_eq!(outcome.action, BetAction::Check);
        assert_eq!(outcome.committed, 0);
        assert_eq!(state.chips, 5000);

        let outcome = state.apply_bet(-1, &mut table_bet);
        assert_eq!(outcome.action, BetAction::Fold);
        assert!(!state.in_hand);
        assert!(state.cards.is_empty());
        assert_eq!(table_bet, 1000);
    }

    #[test]
    fn test_apply_bet_call_and_raise() {
        let mut table_bet = 1000;
        let mut state = state_with(5000);
        state.bet = 500;

        let outcome = state.apply_bet(500, &mut table_bet);
        assert_eq!(outcome.action, BetAction::Call);
        assert!(!outcome.raised);
        assert_eq!(outcome.bet, 1000);
        assert_eq!(outcome.chips, 4500);

        let outcome = state.apply_bet(2000, &mut table_bet);
        assert_eq!(outcome.action, BetAction::Raise);
        assert!(outcome.raised);
        assert_eq!(table_bet, 3000);
        assert_eq!(outcome.committed, 2000);
    }

    #[test]
    fn test_apply_bet_clamps_to_all_in() {
        let mut table_bet = 1000;
        let mut state = state_with(700);

        let outcome = state.apply_bet(5000, &mut table_bet);
        assert_eq!(outcome.action, BetAction::AllIn);
        assert_eq!(outcome.committed, 700);
        assert_eq!(outcome.chips, 0);
        assert!(!outcome.raised);
        assert_eq!(table_bet, 1000);
    }

    #[test]
    fn test_apply_bet_all_in_raise_lifts_table_bet() {
        let mut table_bet = 1000;
        let mut state = state_with(1500);

        let outcome = state.apply_bet(1500, &mut table_bet);
        assert_eq!(outcome.action, BetAction::AllIn);
        assert!(outcome.raised);
        assert_eq!(table_bet, 1500);
    }

    #[tokio::test]
    async fn test_mailbox_drops_newest_on_overflow() {
        let (conn, client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);

        for i in 0..200 {
            assert!(client.send(Message::action("p1", i)));
        }
        drop(client);
        wait_stopped(&occupant).await;

        for i in 0..MAILBOX_CAPACITY as Chips {
            let message = occupant.next_message(Duration::ZERO).await.unwrap();
            assert_eq!(message, Message::action("p1", i));
        }
        assert!(matches!(
            occupant.next_message(Duration::ZERO).await,
            Err(RoomError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_next_message_times_out() {
        let (conn, _client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);

        let result = occupant.next_message(Duration::from_millis(50)).await;
        assert!(matches!(result, Err(RoomError::Timeout)));
    }

    #[tokio::test]
    async fn test_request_action_times_out() {
        let (conn, _client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);
        occupant.state().pos = 1;
        let (_abort_tx, abort_rx) = watch::channel(false);

        let started = Instant::now();
        let reply = occupant
            .request_action(Duration::from_millis(200), abort_rx)
            .await;
        let elapsed = started.elapsed();

        assert!(reply.is_none());
        assert!(elapsed >= Duration::from_millis(190));
        assert!(elapsed < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_request_action_returns_submitted_action() {
        let (conn, _client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);
        occupant.state().pos = 1;
        let (_abort_tx, abort_rx) = watch::channel(false);

        assert!(occupant.submit_action(Message::action("p1", 1000)));
        let reply = occupant
            .request_action(Duration::from_secs(5), abort_rx)
            .await;
        assert_eq!(reply, Some(Message::action("p1", 1000)));
    }

    #[tokio::test]
    async fn test_request_action_observes_abort() {
        let (conn, _client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);
        occupant.state().pos = 1;
        let (abort_tx, abort_rx) = watch::channel(false);

        let waiter = {
            let occupant = Arc::clone(&occupant);
            tokio::spawn(async move {
                occupant
                    .request_action(Duration::from_secs(30), abort_rx)
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        abort_tx.send_replace(true);

        let reply = tokio::time::timeout(Duration::from_secs(2), waiter)
            .await
            .expect("abort did not wake the waiter")
            .unwrap();
        assert!(reply.is_none());
    }

    #[tokio::test]
    async fn test_reconnect_closes_old_mailbox() {
        let (conn, _old_client) = ChannelConnection::pair();
        let occupant = Occupant::new("p1", "Alice", conn);
        assert_eq!(occupant.generation(), 1);

        let (new_conn, new_client) = ChannelConnection::pair();
        let old_reader = {
            let occupant = Arc::clone(&occupant);
            tokio::spawn(async move { occupant.next_message(Duration::ZERO).await })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;
        let generation = occupant.reconnect(new_conn);
        assert_eq!(generation, 2);

        let old = tokio::time::timeout(Duration::from_secs(2), old_reader)
            .await
            .unwrap()
            .unwrap();
        assert!(matches!(old, Err(RoomError::Closed)));

        assert!(new_client.send(Message::action("p1", 0)));
        let message = occupant
            .next_message(Duration::from_secs(2))
            .await
            .unwrap();
        assert_eq!(message, Message::action("p1", 0));
    }
}
