//! Messages exchanged between rooms, occupants and their connections.

use crate::game::{BetAction, Card, Chips};
use serde::{Deserialize, Serialize};

/// Stage or event a presence message announces
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PresenceAction {
    /// Player joined; payload names the room when sent by a client
    Join,
    /// Player left
    Leave,
    /// Full room snapshot
    State,
    /// Button seat
    Button,
    /// Own hole cards
    Preflop,
    /// Three board cards and own hand category
    Flop,
    /// Turn card and own hand category
    Turn,
    /// River card and own hand category
    River,
    /// Prompt: `"pos,bet"`
    Action,
    /// Bet applied: `"action,bet,chips"`
    Bet,
    /// Pot amounts: `"1000,500"`
    Pot,
    /// Final state with cards
    Showdown,
}

impl std::fmt::Display for PresenceAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let repr = match self {
            PresenceAction::Join => "join",
            PresenceAction::Leave => "leave",
            PresenceAction::State => "state",
            PresenceAction::Button => "button",
            PresenceAction::Preflop => "preflop",
            PresenceAction::Flop => "flop",
            PresenceAction::Turn => "turn",
            PresenceAction::River => "river",
            PresenceAction::Action => "action",
            PresenceAction::Bet => "bet",
            PresenceAction::Pot => "pot",
            PresenceAction::Showdown => "showdown",
        };
        write!(f, "{repr}")
    }
}

/// Public view of one occupant
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantView {
    pub id: String,
    pub name: String,
    pub chips: Chips,
    pub pos: usize,
    pub bet: Chips,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<BetAction>,
    /// Only filled for the occupant itself and at showdown
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub cards: Vec<Card>,
    #[serde(default)]
    pub hand: u32,
}

/// Public view of a room
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomView {
    pub id: String,
    pub small_blind: Chips,
    pub big_blind: Chips,
    pub max_seats: usize,
    pub occupied: usize,
    pub timeout_secs: u64,
    pub button: usize,
    pub bet: Chips,
    #[serde(default)]
    pub board: Vec<Card>,
    #[serde(default)]
    pub pots: Vec<Chips>,
    #[serde(default)]
    pub committed: Vec<Chips>,
    pub occupants: Vec<Option<OccupantView>>,
}

/// Presence or state update
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Presence {
    /// Room id, or occupant id for per-player events
    pub from: String,
    pub action: PresenceAction,
    #[serde(default)]
    pub payload: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub occupant: Option<OccupantView>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<RoomView>,
}

/// A player's betting decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionIntent {
    #[serde(default)]
    pub from: String,
    /// Signed chip amount as text: negative folds, zero checks
    #[serde(default)]
    pub amount: String,
}

impl ActionIntent {
    /// Parsed amount. Empty or unparsable text is a fold.
    pub fn amount(&self) -> Chips {
        self.amount.trim().parse().unwrap_or(-1)
    }
}

/// Everything that travels over a connection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Message {
    Presence(Presence),
    Action(ActionIntent),
    Error { code: u16, text: String },
}

impl Message {
    pub fn presence(from: &str, action: PresenceAction, payload: impl Into<String>) -> Self {
        Message::Presence(Presence {
            from: from.to_string(),
            action,
            payload: payload.into(),
            occupant: None,
            room: None,
        })
    }

    pub fn action(from: &str, amount: Chips) -> Self {
        Message::Action(ActionIntent {
            from: from.to_string(),
            amount: amount.to_string(),
        })
    }

    pub fn error(code: u16, text: impl Into<String>) -> Self {
        Message::Error {
            code,
            text: text.into(),
        }
    }

    /// Attach an occupant view to a presence message
    pub fn with_occupant(mut self, view: OccupantView) -> Self {
        if let Message::Presence(presence) = &mut self {
            presence.occupant = Some(view);
        }
        self
    }

    /// Attach a room view to a presence message
    pub fn with_room(mut self, view: RoomView) -> Self {
        if let Message::Presence(presence) = &mut self {
            presence.room = Some(view);
        }
        self
    }

    pub fn as_presence(&self) -> Option<&Presence> {
        match self {
            Message::Presence(presence) => Some(presence),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_intent_amount_parsing() {
        let intent = |amount: &str| ActionIntent {
            from: "p1".to_string(),
            amount: amount.to_string(),
        };
        assert_eq!(intent("1500").amount(), 1500);
        assert_eq!(intent(" 0 ").amount(), 0);
        assert_eq!(intent("-1").amount(), -1);
        assert_eq!(intent("").amount(), -1);
        assert_eq!(intent("all").amount(), -1);
    }

    #[test]
    fn test_message_wire_format() {
        let msg = Message::presence("room-1", PresenceAction::Action, "3,1000");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["type"], "presence");
        assert_eq!(json["action"], "action");
        assert_eq!(json["payload"], "3,1000");
        assert!(json.get("room").is_none());
    }

    #[test]
    fn test_client_action_decodes() {
        let msg: Message =
            serde_json::from_str(r#"{"type":"action","amount":"500"}"#).unwrap();
        match msg {
            Message::Action(intent) => assert_eq!(intent.amount(), 500),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn test_join_decodes_without_optional_fields() {
        let json = r#"{"type":"presence","from":"p1","action":"join","payload":"r1"}"#;
        let msg: Message = serde_json::from_str(json).unwrap();
        let presence = msg.as_presence().unwrap();
        assert_eq!(presence.action, PresenceAction::Join);
        assert_eq!(presence.payload, "r1");
    }
}
