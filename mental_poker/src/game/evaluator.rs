//! Hand-strength evaluation.
//!
//! The room only needs a total order over hands, so evaluators return a
//! packed `u32`: the hand category sits above [`CATEGORY_SHIFT`] and the five
//! tie-breaking values fill the low nibbles, most significant first.

use super::entities::{ACE, Card, Value};
use std::fmt;

/// Comparable strength of a hand. Higher is better, equal hands compare equal.
pub type HandStrength = u32;

pub const CATEGORY_SHIFT: u32 = 20;

#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub enum HandCategory {
    HighCard,
    OnePair,
    TwoPair,
    ThreeOfAKind,
    Straight,
    Flush,
    FullHouse,
    FourOfAKind,
    StraightFlush,
}

impl HandCategory {
    const ALL: [Self; 9] = [
        Self::HighCard,
        Self::OnePair,
        Self::TwoPair,
        Self::ThreeOfAKind,
        Self::Straight,
        Self::Flush,
        Self::FullHouse,
        Self::FourOfAKind,
        Self::StraightFlush,
    ];

    /// Category encoded in a strength value.
    pub fn of(strength: HandStrength) -> Self {
        let idx = (strength >> CATEGORY_SHIFT) as usize;
        Self::ALL[idx.min(Self::ALL.len() - 1)]
    }
}

impl fmt::Display for HandCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::HighCard => "hi",
            Self::OnePair => "1p",
            Self::TwoPair => "2p",
            Self::ThreeOfAKind => "3k",
            Self::Straight => "s8",
            Self::Flush => "fs",
            Self::FullHouse => "fh",
            Self::FourOfAKind => "4k",
            Self::StraightFlush => "sf",
        };
        write!(f, "{repr}")
    }
}

/// Maps five to seven cards to a comparable strength.
pub trait HandEvaluator: Send + Sync {
    fn evaluate(&self, cards: &[Card]) -> HandStrength;
}

/// Best-five-of-n evaluator over a standard 52 card deck.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardEvaluator;

impl HandEvaluator for StandardEvaluator {
    fn evaluate(&self, cards: &[Card]) -> HandStrength {
        if cards.len() < 5 {
            return 0;
        }
        let mut best = 0;
        let n = cards.len();
        for a in 0..n {
            for b in a + 1..n {
                for c in b + 1..n {
                    for d in c + 1..n {
                        for e in d + 1..n {
                            let five = [cards[a], cards[b], cards[c], cards[d], cards[e]];
                            best = best.max(score_five(&five));
                        }
                    }
                }
            }
        }
        best
    }
}

fn pack(category: HandCategory, values: &[Value]) -> HandStrength {
    let mut strength = (category as u32) << CATEGORY_SHIFT;
    for (i, value) in values.iter().take(5).enumerate() {
        strength |= u32::from(*value) << (4 * (4 - i as u32));
    }
    strength
}

/// High card of a straight made by `sorted` (descending, distinct), if any.
fn straight_high(sorted: &[Value]) -> Option<Value> {
    if sorted.len() != 5 {
        return None;
    }
    if sorted.windows(2).all(|w| w[0] == w[1] + 1) {
        return Some(sorted[0]);
    }
    // Wheel: A-2-3-4-5 plays as a five-high straight.
    if sorted == [ACE, 5, 4, 3, 2] {
        return Some(5);
    }
    None
}

fn score_five(cards: &[Card; 5]) -> HandStrength {
    let flush = cards.iter().all(|c| c.1 == cards[0].1);

    // (count, value) groups ordered by count then value, both descending.
    let mut groups: Vec<(u8, Value)> = Vec::with_capacity(5);
    let mut values: Vec<Value> = cards.iter().map(|c| c.0).collect();
    values.sort_unstable_by(|a, b| b.cmp(a));
    for value in &values {
        match groups.iter_mut().find(|(_, v)| v == value) {
            Some(group) => group.0 += 1,
            None => groups.push((1, *value)),
        }
    }
    groups.sort_unstable_by(|a, b| b.cmp(a));
    let ordered: Vec<Value> = groups.iter().map(|(_, v)| *v).collect();

    let distinct: Vec<Value> = {
        let mut d = values.clone();
        d.dedup();
        d
    };
    let straight = straight_high(&distinct);

    match (straight, flush, groups[0].0, groups.get(1).map(|g| g.0)) {
        (Some(high), true, _, _) => pack(HandCategory::StraightFlush, &[high]),
        (_, _, 4, _) => pack(HandCategory::FourOfAKind, &ordered),
        (_, _, 3, Some(2)) => pack(HandCategory::FullHouse, &ordered),
        (_, true, _, _) => pack(HandCategory::Flush, &values),
        (Some(high), false, _, _) => pack(HandCategory::Straight, &[high]),
        (_, _, 3, _) => pack(HandCategory::ThreeOfAKind, &ordered),
        (_, _, 2, Some(2)) => pack(HandCategory::TwoPair, &ordered),
        (_, _, 2, _) => pack(HandCategory::OnePair, &ordered),
        _ => pack(HandCategory::HighCard, &values),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::entities::Suit::{Club, Diamond, Heart, Spade};

    fn eval(cards: &[Card]) -> HandStrength {
        StandardEvaluator.evaluate(cards)
    }

    #[test]
    fn test_categories() {
        let pair = [
            Card(9, Club),
            Card(9, Heart),
            Card(2, Spade),
            Card(5, Diamond),
            Card(13, Club),
        ];
        assert_eq!(HandCategory::of(eval(&pair)), HandCategory::OnePair);

        let wheel = [
            Card(14, Club),
            Card(2, Heart),
            Card(3, Spade),
            Card(4, Diamond),
            Card(5, Club),
        ];
        assert_eq!(HandCategory::of(eval(&wheel)), HandCategory::Straight);

        let boat = [
            Card(7, Club),
            Card(7, Heart),
            Card(7, Spade),
            Card(4, Diamond),
            Card(4, Club),
        ];
        assert_eq!(HandCategory::of(eval(&boat)), HandCategory::FullHouse);

        let royal = [
            Card(10, Spade),
            Card(11, Spade),
            Card(12, Spade),
            Card(13, Spade),
            Card(14, Spade),
        ];
        assert_eq!(HandCategory::of(eval(&royal)), HandCategory::StraightFlush);
    }

    #[test]
    fn test_wheel_loses_to_six_high_straight() {
        let wheel = [
            Card(14, Club),
            Card(2, Heart),
            Card(3, Spade),
            Card(4, Diamond),
            Card(5, Club),
        ];
        let six_high = [
            Card(6, Club),
            Card(2, Heart),
            Card(3, Spade),
            Card(4, Diamond),
            Card(5, Club),
        ];
        assert!(eval(&six_high) > eval(&wheel));
    }

    #[test]
    fn test_kickers_break_ties() {
        let board = [
            Card(14, Diamond),
            Card(7, Club),
            Card(2, Heart),
            Card(9, Spade),
            Card(4, Diamond),
        ];
        let mut king_kicker = board.to_vec();
        king_kicker.extend([Card(14, Club), Card(13, Heart)]);
        let mut queen_kicker = board.to_vec();
        queen_kicker.extend([Card(14, Heart), Card(12, Heart)]);
        assert!(eval(&king_kicker) > eval(&queen_kicker));
    }

    #[test]
    fn test_identical_hands_compare_equal() {
        let a = [
            Card(10, Club),
            Card(10, Heart),
            Card(3, Spade),
            Card(8, Diamond),
            Card(12, Club),
        ];
        let b = [
            Card(10, Spade),
            Card(10, Diamond),
            Card(3, Club),
            Card(8, Heart),
            Card(12, Heart),
        ];
        assert_eq!(eval(&a), eval(&b));
    }

    #[test]
    fn test_best_five_of_seven() {
        let seven = [
            Card(14, Spade),
            Card(14, Heart),
            Card(14, Diamond),
            Card(7, Club),
            Card(2, Heart),
            Card(9, Spade),
            Card(4, Diamond),
        ];
        assert_eq!(HandCategory::of(eval(&seven)), HandCategory::ThreeOfAKind);
    }

    #[test]
    fn test_short_hands_have_no_strength() {
        assert_eq!(eval(&[Card(14, Spade), Card(14, Heart)]), 0);
    }
}
