//! Betting rounds, pots, showdown and settlement for a [`Room`].

use super::{
    actor::{HandReport, Room},
    config::SettlementPolicy,
    errors::RoomError,
    messages::{Message, PresenceAction},
    occupant::Occupant,
};
use crate::{
    game::{BetAction, Chips, HandStrength, award_pots, compute_pots},
    ledger::{Settlement, SettlementEntry},
};
use std::sync::Arc;

impl Room {
    /// Apply a bet intent for the occupant at `pos` and announce it.
    ///
    /// Forced blinds go through here too, bypassing turn order.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the table bet level went up
    pub(super) async fn betting(&self, pos: usize, amount: Chips) -> bool {
        let (announce, raised) = {
            let mut state = self.state.lock().await;
            let Some(occupant) = state.occupant_at(pos).cloned() else {
                return false;
            };

            let outcome = occupant.apply_bet(amount, &mut state.bet);
            state.committed[pos - 1] += outcome.committed;
            match outcome.action {
                BetAction::Fold => state.remain = state.remain.saturating_sub(1),
                BetAction::AllIn => state.allin += 1,
                _ => {}
            }

            let payload = format!("{},{},{}", outcome.action, outcome.bet, outcome.chips);
            (
                Message::presence(occupant.id(), PresenceAction::Bet, payload),
                outcome.raised,
            )
        };

        self.broadcast(&announce).await;
        raised
    }

    /// Run one betting round starting at seat `start` (0 for the seat left
    /// of the button).
    ///
    /// Each contesting seat with chips is prompted in seating order. A raise
    /// restarts the trip from the raiser, who is then skipped until someone
    /// raises again. The round ends after a full trip without a raise, or
    /// as soon as at most one seat is still contesting.
    pub(super) async fn run_betting_round(&self, start: usize) {
        let (cap, mut pos) = {
            let state = self.state.lock().await;
            if state.allin + 1 >= state.remain {
                return;
            }
            let cap = state.capacity();
            let pos = if start == 0 {
                state.button % cap + 1
            } else {
                start
            };
            (cap, pos)
        };
        let mut skip = 0;

        loop {
            let mut raised = 0;

            for step in 0..cap {
                let seat = (pos - 1 + step) % cap + 1;
                let (occupant, bet) = {
                    let state = self.state.lock().await;
                    if state.remain <= 1 {
                        return;
                    }
                    if seat == skip {
                        continue;
                    }
                    let Some(occupant) = state.occupant_at(seat) else {
                        continue;
                    };
                    let (chips, in_hand) = {
                        let player = occupant.state();
                        (player.chips, player.in_hand)
                    };
                    if chips == 0 || !in_hand {
                        continue;
                    }
                    (Arc::clone(occupant), state.bet)
                };

                occupant.clear_pending_actions();
                self.broadcast(&Message::presence(
                    self.id(),
                    PresenceAction::Action,
                    format!("{},{}", seat, bet),
                ))
                .await;

                let reply = occupant
                    .request_action(self.action_timeout(), self.abort.subscribe())
                    .await;
                if self.remain().await <= 1 {
                    return;
                }

                let amount = match reply {
                    Some(Message::Action(intent)) => intent.amount(),
                    _ => {
                        log::debug!("Room {}: seat {} folded by timeout", self.id(), seat);
                        -1
                    }
                };
                if self.betting(seat, amount).await {
                    raised = seat;
                    break;
                }
            }

            if raised == 0 {
                break;
            }
            pos = raised;
            skip = raised;
        }
    }

    /// Start a new street: table bet and per-street bets back to zero.
    pub(super) async fn reset_street(&self) {
        let mut state = self.state.lock().await;
        state.bet = 0;
        for occupant in state.seated() {
            occupant.state().bet = 0;
        }
    }

    /// Recompute pots from commitments and announce the amounts.
    pub(super) async fn publish_pots(&self) {
        let amounts = {
            let mut state = self.state.lock().await;
            let live = live_seats(&state.seats);
            let pots = compute_pots(&state.committed, &live);
            state.pots = pots.iter().map(|p| p.amount).collect();
            state.pots.clone()
        };
        self.broadcast(&Message::presence(
            self.id(),
            PresenceAction::Pot,
            join_amounts(&amounts),
        ))
        .await;
    }

    /// Award every pot to its best eligible hands and show all cards.
    pub(super) async fn showdown(&self, report: &mut HandReport) {
        let (amounts, view) = {
            let mut state = self.state.lock().await;
            let board = state.board.clone();

            let strengths: Vec<Option<HandStrength>> = state
                .seats
                .iter()
                .map(|seat| {
                    seat.as_ref().and_then(|occupant| {
                        let mut player = occupant.state();
                        if !player.in_hand {
                            return None;
                        }
                        let mut all = player.cards.clone();
                        all.extend(board.iter().copied());
                        player.hand = self.evaluator.evaluate(&all);
                        Some(player.hand)
                    })
                })
                .collect();

            let live: Vec<bool> = strengths.iter().map(Option::is_some).collect();
            let pots = compute_pots(&state.committed, &live);
            let winnings = award_pots(&pots, &strengths);

            for (seat, won) in state.seats.iter().zip(&winnings) {
                if let Some(occupant) = seat {
                    occupant.state().chips += won;
                }
            }

            state.pots = pots.iter().map(|p| p.amount).collect();
            report.board = board;
            report.pots = pots;
            report.winnings = winnings;
            (state.pots.clone(), self.view(&state, None, true))
        };

        self.broadcast(&Message::presence(
            self.id(),
            PresenceAction::Pot,
            join_amounts(&amounts),
        ))
        .await;
        self.broadcast(
            &Message::presence(self.id(), PresenceAction::Showdown, "").with_room(view),
        )
        .await;
    }

    /// End the hand sequence if the settlement policy says so.
    ///
    /// Every seated occupant leaves and the session holders' final stacks
    /// are reported to the ledger once. Ledger failures are logged and not
    /// retried.
    ///
    /// # Returns
    ///
    /// * `bool` - Whether the game was settled
    pub(super) async fn check_settlement(&self, game_id: &str) -> bool {
        let (entries, seated) = {
            let state = self.state.lock().await;
            let holders: Vec<&Arc<Occupant>> = state
                .seated()
                .filter(|o| o.state().session.is_some())
                .collect();
            let with_chips = holders.iter().filter(|o| o.chips() > 0).count();

            let ended = match self.config().settlement {
                SettlementPolicy::HeadsUp => holders.len() == 2 && with_chips <= 1,
                SettlementPolicy::LastStanding => holders.len() >= 2 && with_chips <= 1,
            };
            if !ended {
                return false;
            }

            let entries: Vec<SettlementEntry> = holders
                .iter()
                .map(|o| SettlementEntry {
                    player: o.id().to_string(),
                    chips: o.chips(),
                })
                .collect();
            (entries, state.seated().cloned().collect::<Vec<_>>())
        };

        log::info!(
            "Room {}: game {} over, settling {} players",
            self.id(),
            game_id,
            entries.len()
        );
        for occupant in seated {
            occupant.leave().await;
        }

        let settlement = Settlement::new(game_id.to_string(), entries);
        if let Err(e) = self.ledger.end_game(&settlement).await {
            let err = RoomError::SettlementFailed(e);
            log::error!("Room {}: {}", self.id(), err);
        }
        true
    }
}

fn live_seats(seats: &[Option<Arc<Occupant>>]) -> Vec<bool> {
    seats
        .iter()
        .map(|seat| seat.as_ref().is_some_and(|o| o.state().in_hand))
        .collect()
}

fn join_amounts(amounts: &[Chips]) -> String {
    amounts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
