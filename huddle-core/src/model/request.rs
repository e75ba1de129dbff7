use crate::model::ids::{RoomId, UserId};
use serde::{Deserialize, Serialize};

/// Body of `POST /api/room/join`. An empty `room_id` creates a new room.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JoinRequest {
    #[serde(default)]
    pub room_id: RoomId,
    #[serde(default)]
    pub user_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinResponse {
    pub room_id: RoomId,
    pub user_id: UserId,
    pub users_in_room: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LeaveRequest {
    #[serde(default)]
    pub room_id: RoomId,
    #[serde(default)]
    pub user_id: UserId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineUsersResponse {
    pub room_id: RoomId,
    pub users: Vec<String>,
}
