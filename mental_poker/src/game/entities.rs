use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Club,
    Spade,
    Diamond,
    Heart,
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Club => "♣",
            Self::Spade => "♠",
            Self::Diamond => "♦",
            Self::Heart => "♥",
        };
        write!(f, "{repr}")
    }
}

/// Card values run from 2 (deuce) to 14 (ace).
pub type Value = u8;

pub const ACE: Value = 14;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub struct Card(pub Value, pub Suit);

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            14 => write!(f, "A{}", self.1),
            13 => write!(f, "K{}", self.1),
            12 => write!(f, "Q{}", self.1),
            11 => write!(f, "J{}", self.1),
            v => write!(f, "{v}{}", self.1),
        }
    }
}

/// Joins cards into the compact comma separated form used in payloads.
pub fn join_cards(cards: &[Card]) -> String {
    cards
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CardError {
    #[error("unknown card suit {0:?}")]
    UnknownSuit(String),
    #[error("unknown card value {0:?}")]
    UnknownValue(String),
}

/// Rank and suit as spelled by the card-crypto collaborator.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct ClassicCard {
    pub value: String,
    pub suite: String,
}

impl ClassicCard {
    pub fn new(value: &str, suite: &str) -> Self {
        Self {
            value: value.to_string(),
            suite: suite.to_string(),
        }
    }
}

impl TryFrom<&ClassicCard> for Card {
    type Error = CardError;

    fn try_from(classic: &ClassicCard) -> Result<Self, Self::Error> {
        let suit = match classic.suite.as_str() {
            "Heart" => Suit::Heart,
            "Club" => Suit::Club,
            "Spade" => Suit::Spade,
            "Diamond" => Suit::Diamond,
            other => return Err(CardError::UnknownSuit(other.to_string())),
        };
        let value = match classic.value.as_str() {
            "Two" => 2,
            "Three" => 3,
            "Four" => 4,
            "Five" => 5,
            "Six" => 6,
            "Seven" => 7,
            "Eight" => 8,
            "Nine" => 9,
            "Ten" => 10,
            "Jack" => 11,
            "Queen" => 12,
            "King" => 13,
            "Ace" => ACE,
            other => return Err(CardError::UnknownValue(other.to_string())),
        };
        Ok(Card(value, suit))
    }
}

impl From<Card> for ClassicCard {
    fn from(card: Card) -> Self {
        let value = match card.0 {
            2 => "Two",
            3 => "Three",
            4 => "Four",
            5 => "Five",
            6 => "Six",
            7 => "Seven",
            8 => "Eight",
            9 => "Nine",
            10 => "Ten",
            11 => "Jack",
            12 => "Queen",
            13 => "King",
            _ => "Ace",
        };
        let suite = match card.1 {
            Suit::Heart => "Heart",
            Suit::Club => "Club",
            Suit::Spade => "Spade",
            Suit::Diamond => "Diamond",
        };
        ClassicCard::new(value, suite)
    }
}

/// Chip amounts. Signed so a bet intent can carry a fold (negative).
pub type Chips = i64;

/// Label of the last betting decision taken by an occupant.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BetAction {
    Fold,
    Check,
    Call,
    Raise,
    #[serde(rename = "allin")]
    AllIn,
}

impl fmt::Display for BetAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let repr = match self {
            Self::Fold => "fold",
            Self::Check => "check",
            Self::Call => "call",
            Self::Raise => "raise",
            Self::AllIn => "allin",
        };
        write!(f, "{repr}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_display() {
        assert_eq!(Card(14, Suit::Spade).to_string(), "A♠");
        assert_eq!(Card(10, Suit::Heart).to_string(), "10♥");
        assert_eq!(Card(2, Suit::Club).to_string(), "2♣");
    }

    #[test]
    fn test_join_cards() {
        let cards = [Card(13, Suit::Diamond), Card(7, Suit::Club)];
        assert_eq!(join_cards(&cards), "K♦,7♣");
        assert_eq!(join_cards(&[]), "");
    }

    #[test]
    fn test_classic_card_conversion() {
        let classic = ClassicCard::new("Queen", "Heart");
        assert_eq!(Card::try_from(&classic), Ok(Card(12, Suit::Heart)));
        assert_eq!(ClassicCard::from(Card(12, Suit::Heart)), classic);
    }

    #[test]
    fn test_classic_card_rejects_unknown_names() {
        let bad_suit = ClassicCard::new("Two", "Star");
        assert_eq!(
            Card::try_from(&bad_suit),
            Err(CardError::UnknownSuit("Star".to_string()))
        );
        let bad_value = ClassicCard::new("One", "Club");
        assert_eq!(
            Card::try_from(&bad_value),
            Err(CardError::UnknownValue("One".to_string()))
        );
    }

    #[test]
    fn test_bet_action_labels() {
        assert_eq!(BetAction::AllIn.to_string(), "allin");
        assert_eq!(
            serde_json::to_string(&BetAction::AllIn).unwrap(),
            "\"allin\""
        );
        assert_eq!(serde_json::to_string(&BetAction::Fold).unwrap(), "\"fold\"");
    }
}
