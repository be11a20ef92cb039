//! Registry of live rooms.

use super::{
    actor::Room,
    config::RoomConfig,
    errors::{RoomError, RoomResult},
    occupant::Occupant,
};
use crate::{
    crypto::CardCrypto,
    game::{Chips, HandEvaluator},
    ledger::SettlementLedger,
};
use serde::Serialize;
use std::{collections::HashMap, sync::Arc};
use tokio::sync::RwLock;

/// Where a connected player currently sits
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlayerInfo {
    pub room_id: String,
    pub user_id: String,
    pub chips: Chips,
}

/// Room registry shared by every connection
pub struct RoomRegistry {
    /// Live rooms by id
    rooms: RwLock<HashMap<String, Arc<Room>>>,

    crypto: Arc<dyn CardCrypto>,
    evaluator: Arc<dyn HandEvaluator>,
    ledger: Arc<dyn SettlementLedger>,

    /// Configuration for rooms created on demand
    defaults: RoomConfig,
}

impl RoomRegistry {
    /// Create a new registry
    ///
    /// # Arguments
    ///
    /// * `crypto` - Card-crypto collaborator shared by all rooms
    /// * `evaluator` - Hand evaluator shared by all rooms
    /// * `ledger` - Settlement ledger shared by all rooms
    /// * `defaults` - Configuration for rooms created on demand
    pub fn new(
        crypto: Arc<dyn CardCrypto>,
        evaluator: Arc<dyn HandEvaluator>,
        ledger: Arc<dyn SettlementLedger>,
        defaults: RoomConfig,
    ) -> Arc<Self> {
        Arc::new(Self {
            rooms: RwLock::new(HashMap::new()),
            crypto,
            evaluator,
            ledger,
            defaults,
        })
    }

    pub fn defaults(&self) -> &RoomConfig {
        &self.defaults
    }

    /// Route a player to a room
    ///
    /// Returns the room with this id if it exists. Otherwise any room with
    /// a free seat is reused, and only when every room is full is a new
    /// room created under `id` with the default configuration.
    pub async fn get_or_create(self: &Arc<Self>, id: &str) -> Arc<Room> {
        let mut rooms = self.rooms.write().await;
        if let Some(room) = rooms.get(id) {
            if !room.is_closed() {
                return Arc::clone(room);
            }
        }
        if let Some(room) = rooms.values().find(|room| room.has_free_seat()) {
            log::debug!("Routing request for room {} to room {}", id, room.id());
            return Arc::clone(room);
        }

        let room = self.spawn_room(id, self.defaults.clone());
        rooms.insert(id.to_string(), Arc::clone(&room));
        room
    }

    /// Create a room with an explicit configuration
    ///
    /// # Returns
    ///
    /// * `RoomResult<Arc<Room>>` - The new room, `InvalidConfig` when the
    ///   configuration does not validate or the id is taken
    pub async fn create(self: &Arc<Self>, id: &str, config: RoomConfig) -> RoomResult<Arc<Room>> {
        config.validate().map_err(RoomError::InvalidConfig)?;

        let mut rooms = self.rooms.write().await;
        if rooms.get(id).is_some_and(|room| !room.is_closed()) {
            return Err(RoomError::InvalidConfig(format!("room {} already exists", id)));
        }
        let room = self.spawn_room(id, config);
        rooms.insert(id.to_string(), Arc::clone(&room));
        Ok(room)
    }

    fn spawn_room(self: &Arc<Self>, id: &str, config: RoomConfig) -> Arc<Room> {
        Room::new(
            id,
            config,
            Arc::clone(&self.crypto),
            Arc::clone(&self.evaluator),
            Arc::clone(&self.ledger),
            Arc::downgrade(self),
        )
    }

    pub async fn get(&self, id: &str) -> Option<Arc<Room>> {
        self.rooms.read().await.get(id).cloned()
    }

    /// Forget a torn-down room. A newer room registered under the same id
    /// is left alone.
    pub(super) async fn remove(&self, room: &Room) {
        let mut rooms = self.rooms.write().await;
        let current = rooms
            .get(room.id())
            .is_some_and(|entry| std::ptr::eq(Arc::as_ptr(entry), room));
        if current {
            rooms.remove(room.id());
            log::debug!("Room {} removed from registry", room.id());
        }
    }

    pub async fn rooms(&self) -> Vec<Arc<Room>> {
        self.rooms.read().await.values().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.rooms.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.rooms.read().await.is_empty()
    }

    /// Locate a seated occupant by id across all rooms
    pub async fn find_occupant(&self, id: &str) -> Option<(Arc<Room>, Arc<Occupant>)> {
        for room in self.rooms().await {
            if let Some(occupant) = room.occupant(id).await {
                return Some((room, occupant));
            }
        }
        None
    }

    /// Room and stack of a seated player
    pub async fn player_info(&self, id: &str) -> Option<PlayerInfo> {
        let (room, occupant) = self.find_occupant(id).await?;
        Some(PlayerInfo {
            room_id: room.id().to_string(),
            user_id: occupant.id().to_string(),
            chips: occupant.chips(),
        })
    }
}
