//! Side pot construction and showdown distribution.

use super::{entities::Chips, evaluator::HandStrength};
use serde::Serialize;

/// A pot and the seat positions (1-based) that may win it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct HandPot {
    pub amount: Chips,
    pub eligible: Vec<usize>,
}

/// Splits per-seat commitments into a main pot and side pots.
///
/// `committed[i]` is everything seat `i + 1` put in this hand and `live[i]`
/// whether that seat still holds cards. Every distinct commitment tier forms
/// a pot of `(tier - previous tier) * seats committing at least tier`, won
/// only by live seats that reached the tier. A tier nobody live reached is
/// merged into the pot below it. When no live seat committed anything, all
/// chips form one pot for every live seat, refunded to the contributors if
/// nobody holds cards. The pots always sum to the commitments and never
/// have an empty `eligible` list.
pub fn compute_pots(committed: &[Chips], live: &[bool]) -> Vec<HandPot> {
    let mut tiers: Vec<Chips> = committed.iter().copied().filter(|c| *c > 0).collect();
    tiers.sort_unstable();
    tiers.dedup();

    let is_live = |idx: usize| live.get(idx).copied().unwrap_or(false);
    let mut pots: Vec<HandPot> = Vec::with_capacity(tiers.len());
    let mut previous = 0;
    let mut carry = 0;

    for tier in tiers {
        let contributors: Vec<usize> = committed
            .iter()
            .enumerate()
            .filter(|(_, amount)| **amount >= tier)
            .map(|(idx, _)| idx)
            .collect();
        let amount = (tier - previous) * contributors.len() as Chips + carry;
        previous = tier;
        carry = 0;

        let eligible: Vec<usize> = contributors
            .into_iter()
            .filter(|idx| is_live(*idx))
            .map(|idx| idx + 1)
            .collect();

        if eligible.is_empty() {
            match pots.last_mut() {
                Some(below) => below.amount += amount,
                None => carry = amount,
            }
            continue;
        }
        pots.push(HandPot { amount, eligible });
    }

    if carry > 0 {
        // No live seat contributed: the live seats contest it, or the
        // contributors get it back when nobody holds cards.
        let mut eligible: Vec<usize> = (0..committed.len())
            .filter(|idx| is_live(*idx))
            .map(|idx| idx + 1)
            .collect();
        if eligible.is_empty() {
            eligible = committed
                .iter()
                .enumerate()
                .filter(|(_, amount)| **amount > 0)
                .map(|(idx, _)| idx + 1)
                .collect();
        }
        pots.push(HandPot {
            amount: carry,
            eligible,
        });
    }
    pots
}

/// Pays out each pot to its best eligible hands.
///
/// `strengths[i]` is `None` for a seat without cards. Ties split a pot
/// evenly and the odd chips go to the first winner in seating order.
/// A pot none of whose eligible seats holds cards is split among them
/// as if tied. Returns the winnings per seat, indexed like `strengths`.
pub fn award_pots(pots: &[HandPot], strengths: &[Option<HandStrength>]) -> Vec<Chips> {
    let mut winnings = vec![0; strengths.len()];

    for pot in pots {
        let contenders: Vec<(usize, HandStrength)> = pot
            .eligible
            .iter()
            .filter_map(|pos| {
                strengths
                    .get(pos.wrapping_sub(1))
                    .copied()
                    .flatten()
                    .map(|s| (pos - 1, s))
            })
            .collect();

        let winners: Vec<usize> = match contenders.iter().map(|(_, s)| *s).max() {
            Some(best) => contenders
                .iter()
                .filter(|(_, s)| *s == best)
                .map(|(idx, _)| *idx)
                .collect(),
            None => {
                log::warn!("Pot of {} chips uncontested, returned to its seats", pot.amount);
                pot.eligible
                    .iter()
                    .filter(|pos| **pos >= 1 && **pos <= strengths.len())
                    .map(|pos| pos - 1)
                    .collect()
            }
        };
        if winners.is_empty() {
            log::error!("No seat to award pot of {} chips", pot.amount);
            continue;
        }

        let share = pot.amount / winners.len() as Chips;
        for idx in &winners {
            winnings[*idx] += share;
        }
        winnings[winners[0]] += pot.amount % winners.len() as Chips;
    }

    winnings
}
