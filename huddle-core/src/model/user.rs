use crate::model::ids::UserId;
use serde::{Deserialize, Serialize};

/// Member of exactly one room. Created offline on join; the online flag
/// flips only while a signaling connection is active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub user_id: UserId,
    pub user_name: String,
    pub is_online: bool,
}

impl User {
    pub fn new(user_id: UserId, user_name: impl Into<String>) -> Self {
        Self {
            user_id,
            user_name: user_name.into(),
            is_online: false,
        }
    }
}
