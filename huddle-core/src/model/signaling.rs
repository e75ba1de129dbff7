use crate::model::ids::UserId;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Offer,
    Answer,
    IceCandidate,
    UserJoined,
    UserLeft,
    /// Any other `type` value. Accepted on the wire, never relayed.
    #[serde(other)]
    Unknown,
}

impl MessageKind {
    /// Offer/answer/ICE go to exactly one peer named by `to`.
    pub fn is_point_to_point(self) -> bool {
        matches!(self, Self::Offer | Self::Answer | Self::IceCandidate)
    }
}

/// Envelope exchanged over a signaling connection in both directions.
///
/// Only the envelope is structured; `data` is relayed untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalingMessage {
    #[serde(rename = "type")]
    pub kind: MessageKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<UserId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<UserId>,
}

impl SignalingMessage {
    pub fn new(kind: MessageKind, data: Option<Value>) -> Self {
        Self {
            kind,
            data,
            from: None,
            to: None,
        }
    }

    pub fn user_joined(user_id: &UserId, user_name: &str) -> Self {
        Self::new(
            MessageKind::UserJoined,
            Some(json!({ "user_id": user_id, "user_name": user_name })),
        )
        .with_from(user_id.clone())
    }

    pub fn user_left(user_id: &UserId) -> Self {
        Self::new(MessageKind::UserLeft, Some(json!({ "user_id": user_id })))
            .with_from(user_id.clone())
    }

    pub fn with_from(mut self, from: UserId) -> Self {
        self.from = Some(from);
        self
    }

    /// Addressed recipient; an empty `to` counts as none.
    pub fn recipient(&self) -> Option<&UserId> {
        self.to.as_ref().filter(|to| !to.is_empty())
    }
}
