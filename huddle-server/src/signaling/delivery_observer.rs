use crate::error::ConnectionError;
use huddle_core::{RoomId, UserId};
use tracing::{debug, warn};

/// Why an inbound message was not relayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DropReason {
    /// Payload did not parse as a signaling envelope.
    Malformed,
    /// Point-to-point message without a `to`.
    MissingRecipient,
    UnsupportedType,
    /// Addressed peer is not connected or its delivery failed.
    RecipientUnavailable,
}

/// Reporting hook for best-effort delivery.
///
/// Called from connection tasks and broadcast fan-out tasks; must not block.
/// Relay behaviour never depends on what an observer does.
pub trait DeliveryObserver: Send + Sync + 'static {
    fn on_delivery_failed(&self, room_id: &RoomId, user_id: &UserId, error: &ConnectionError);

    /// `user_id` is the sender of the dropped message.
    fn on_message_dropped(&self, _room_id: &RoomId, _user_id: &UserId, _reason: DropReason) {}
}

/// Logs every report through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl DeliveryObserver for TracingObserver {
    fn on_delivery_failed(&self, room_id: &RoomId, user_id: &UserId, error: &ConnectionError) {
        warn!(room_id = %room_id, user_id = %user_id, "Delivery failed: {}", error);
    }

    fn on_message_dropped(&self, room_id: &RoomId, user_id: &UserId, reason: DropReason) {
        debug!(room_id = %room_id, user_id = %user_id, ?reason, "Message dropped");
    }
}
