use crate::model::ids::{RoomId, UserId};
use crate::model::user::User;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub room_id: RoomId,
    pub users: Vec<User>,
    pub created_at: DateTime<Utc>,
}

impl Room {
    /// Empty room stamped with the current time.
    pub fn new(room_id: RoomId) -> Self {
        Self {
            room_id,
            users: Vec::new(),
            created_at: Utc::now(),
        }
    }

    pub fn user(&self, user_id: &UserId) -> Option<&User> {
        self.users.iter().find(|u| &u.user_id == user_id)
    }
}
