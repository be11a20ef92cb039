//! Per-occupant message routing loop.

use super::{
    errors::RoomError,
    messages::{Message, PresenceAction},
    occupant::Occupant,
    registry::RoomRegistry,
};
use std::{sync::Arc, time::Duration};

/// Route an occupant's inbound messages until its connection ends
///
/// Betting decisions go to the occupant's action channel; `join` and
/// `leave` presences are handled through the registry. When the mailbox
/// closes the occupant leaves its room, unless a reconnect has replaced
/// the connection this loop was started for.
///
/// # Arguments
///
/// * `occupant` - Occupant to serve
/// * `registry` - Registry used to resolve join requests
/// * `generation` - Connection generation this loop belongs to
pub async fn serve_occupant(occupant: Arc<Occupant>, registry: Arc<RoomRegistry>, generation: u64) {
    loop {
        let message = match occupant.next_message(Duration::ZERO).await {
            Ok(message) => message,
            Err(RoomError::Closed) => break,
            Err(e) => {
                log::debug!("Occupant {}: mailbox read failed: {}", occupant.id(), e);
                continue;
            }
        };

        match message {
            Message::Action(_) => {
                occupant.submit_action(message);
            }
            Message::Presence(presence) => match presence.action {
                PresenceAction::Join => {
                    let requested = presence.payload.trim();
                    let room_id = if requested.is_empty() {
                        uuid::Uuid::new_v4().to_string()
                    } else {
                        requested.to_string()
                    };
                    let room = registry.get_or_create(&room_id).await;
                    if let Err(e) = room.join(&occupant, 0).await {
                        log::debug!(
                            "Occupant {}: join {} failed: {}",
                            occupant.id(),
                            room.id(),
                            e
                        );
                        let reply = Message::error(e.code(), e.client_message());
                        if let Err(e) = occupant.send(&reply).await {
                            log::debug!("Occupant {}: failed to send error: {}", occupant.id(), e);
                        }
                    }
                }
                PresenceAction::Leave => occupant.leave().await,
                other => {
                    log::warn!("Occupant {}: unexpected presence {}", occupant.id(), other);
                }
            },
            Message::Error { code, text } => {
                log::warn!("Occupant {}: client error {}: {}", occupant.id(), code, text);
            }
        }
    }

    if occupant.generation() == generation {
        log::debug!("Occupant {}: connection ended", occupant.id());
        occupant.leave().await;
    }
}
