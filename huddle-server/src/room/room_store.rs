use crate::error::StoreError;
use huddle_core::{Room, RoomId, User, UserId};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::{debug, info};

/// Authoritative room -> members mapping.
///
/// One coarse lock guards the whole map, so every operation is linearizable
/// with respect to every other. Reads hand out clones; nothing inside the
/// store is ever reachable by reference from outside.
///
/// Rooms are never removed, even once empty.
#[derive(Default)]
pub struct RoomStore {
    rooms: RwLock<HashMap<RoomId, Room>>,
}

impl RoomStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_room(&self, room: Room) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();

        if rooms.contains_key(&room.room_id) {
            return Err(StoreError::RoomAlreadyExists(room.room_id));
        }

        info!(room_id = %room.room_id, "Room created");
        rooms.insert(room.room_id.clone(), room);
        Ok(())
    }

    /// Deep copy of the room, or `None` when it does not exist.
    pub fn get_room(&self, room_id: &RoomId) -> Option<Room> {
        self.rooms.read().get(room_id).cloned()
    }

    pub fn add_user(&self, room_id: &RoomId, user: User) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        if room.user(&user.user_id).is_some() {
            return Err(StoreError::UserAlreadyExists {
                room_id: room_id.clone(),
                user_id: user.user_id,
            });
        }

        debug!(room_id = %room_id, user_id = %user.user_id, "User added");
        room.users.push(user);
        Ok(())
    }

    pub fn remove_user(&self, room_id: &RoomId, user_id: &UserId) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let Some(idx) = room.users.iter().position(|u| &u.user_id == user_id) else {
            return Err(StoreError::UserNotFound {
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            });
        };

        room.users.remove(idx);
        debug!(room_id = %room_id, user_id = %user_id, "User removed");
        Ok(())
    }

    pub fn set_online(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        online: bool,
    ) -> Result<(), StoreError> {
        let mut rooms = self.rooms.write();
        let room = rooms
            .get_mut(room_id)
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))?;

        let user = room
            .users
            .iter_mut()
            .find(|u| &u.user_id == user_id)
            .ok_or_else(|| StoreError::UserNotFound {
                room_id: room_id.clone(),
                user_id: user_id.clone(),
            })?;

        user.is_online = online;
        Ok(())
    }

    /// Copy of the current membership.
    pub fn list_users(&self, room_id: &RoomId) -> Result<Vec<User>, StoreError> {
        self.rooms
            .read()
            .get(room_id)
            .map(|room| room.users.clone())
            .ok_or_else(|| StoreError::RoomNotFound(room_id.clone()))
    }

    pub fn room_count(&self) -> usize {
        self.rooms.read().len()
    }
}
