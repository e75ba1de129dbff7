use crate::error::{ConnectionError, RegistryError};
use crate::signaling::DeliveryObserver;
use crate::transport::ConnectionHandle;
use bytes::Bytes;
use dashmap::DashMap;
use futures::future::join_all;
use huddle_core::{RoomId, SignalingMessage, UserId};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info};

/// Live outbound channels, keyed by room and then by user.
///
/// A room entry exists only while it holds at least one connection. Map
/// guards are never held across an await: deliveries work on a snapshot of
/// the recipients.
pub struct ConnectionRegistry {
    rooms: DashMap<RoomId, HashMap<UserId, ConnectionHandle>>,
    observer: Arc<dyn DeliveryObserver>,
    delivery_timeout: Option<Duration>,
}

impl ConnectionRegistry {
    pub fn new(observer: Arc<dyn DeliveryObserver>) -> Self {
        Self {
            rooms: DashMap::new(),
            observer,
            delivery_timeout: None,
        }
    }

    /// Bound every single delivery attempt. `None` waits indefinitely.
    pub fn with_delivery_timeout(mut self, delivery_timeout: Option<Duration>) -> Self {
        self.delivery_timeout = delivery_timeout;
        self
    }

    pub fn observer(&self) -> &Arc<dyn DeliveryObserver> {
        &self.observer
    }

    /// Last writer wins: an existing registration for the pair is replaced.
    pub fn register(&self, room_id: &RoomId, user_id: &UserId, conn: ConnectionHandle) {
        let replaced = self
            .rooms
            .entry(room_id.clone())
            .or_default()
            .insert(user_id.clone(), conn)
            .is_some();

        info!(room_id = %room_id, user_id = %user_id, replaced, "Connection registered");
    }

    /// Remove the pair's registration only while it still holds `conn`.
    ///
    /// Returns `false` when nothing was removed: the pair was never
    /// registered, or a newer connection has since replaced `conn`.
    pub fn unregister(&self, room_id: &RoomId, user_id: &UserId, conn: &ConnectionHandle) -> bool {
        let removed = match self.rooms.get_mut(room_id) {
            Some(mut conns) => {
                let owned = conns
                    .get(user_id)
                    .is_some_and(|current| Arc::ptr_eq(current, conn));
                if owned {
                    conns.remove(user_id);
                }
                owned
            }
            None => false,
        };

        self.rooms.remove_if(room_id, |_, conns| conns.is_empty());

        if removed {
            info!(room_id = %room_id, user_id = %user_id, "Connection unregistered");
        } else {
            debug!(room_id = %room_id, user_id = %user_id, "Unregister skipped, not the current connection");
        }
        removed
    }

    /// Deliver to every connection in the room except `exclude`, one task per
    /// recipient, and wait for all of them.
    ///
    /// Returns how many recipients accepted the message. Individual failures
    /// go to the observer and never fail the call.
    pub async fn broadcast(
        &self,
        room_id: &RoomId,
        message: &SignalingMessage,
        exclude: Option<&UserId>,
    ) -> Result<usize, RegistryError> {
        let recipients: Vec<(UserId, ConnectionHandle)> = {
            let conns = self
                .rooms
                .get(room_id)
                .filter(|conns| !conns.is_empty())
                .ok_or_else(|| RegistryError::RoomHasNoConnections(room_id.clone()))?;

            conns
                .iter()
                .filter(|(user_id, _)| Some(*user_id) != exclude)
                .map(|(user_id, conn)| (user_id.clone(), Arc::clone(conn)))
                .collect()
        };

        let payload = encode(message)?;
        debug!(
            room_id = %room_id,
            kind = ?message.kind,
            recipients = recipients.len(),
            "Broadcasting"
        );

        let tasks = recipients.into_iter().map(|(user_id, conn)| {
            let payload = payload.clone();
            let room_id = room_id.clone();
            let observer = Arc::clone(&self.observer);
            let limit = self.delivery_timeout;

            tokio::spawn(async move {
                match deliver(&conn, payload, limit).await {
                    Ok(()) => true,
                    Err(e) => {
                        observer.on_delivery_failed(&room_id, &user_id, &e);
                        false
                    }
                }
            })
        });

        let delivered = join_all(tasks)
            .await
            .into_iter()
            .filter(|result| match result {
                Ok(delivered) => *delivered,
                Err(e) => {
                    error!("Broadcast task failed: {}", e);
                    false
                }
            })
            .count();

        Ok(delivered)
    }

    pub async fn send_to_user(
        &self,
        room_id: &RoomId,
        user_id: &UserId,
        message: &SignalingMessage,
    ) -> Result<(), RegistryError> {
        let conn = {
            let conns = self
                .rooms
                .get(room_id)
                .ok_or_else(|| RegistryError::RoomHasNoConnections(room_id.clone()))?;

            conns
                .get(user_id)
                .cloned()
                .ok_or_else(|| RegistryError::UserNotConnected {
                    room_id: room_id.clone(),
                    user_id: user_id.clone(),
                })?
        };

        let payload = encode(message)?;

        deliver(&conn, payload, self.delivery_timeout)
            .await
            .map_err(|source| {
                self.observer.on_delivery_failed(room_id, user_id, &source);
                RegistryError::Delivery {
                    user_id: user_id.clone(),
                    source,
                }
            })
    }

    pub fn connection_count(&self, room_id: &RoomId) -> usize {
        self.rooms.get(room_id).map_or(0, |conns| conns.len())
    }

    pub fn is_connected(&self, room_id: &RoomId, user_id: &UserId) -> bool {
        self.rooms
            .get(room_id)
            .is_some_and(|conns| conns.contains_key(user_id))
    }

    /// Rooms with at least one live connection.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

fn encode(message: &SignalingMessage) -> Result<Bytes, RegistryError> {
    serde_json::to_vec(message).map(Bytes::from).map_err(|e| {
        error!("Failed to serialize signaling message: {}", e);
        RegistryError::Encode(e)
    })
}

async fn deliver(
    conn: &ConnectionHandle,
    payload: Bytes,
    limit: Option<Duration>,
) -> Result<(), ConnectionError> {
    match limit {
        Some(limit) => tokio::time::timeout(limit, conn.send(payload))
            .await
            .map_err(|_| ConnectionError::Timeout(limit))?,
        None => conn.send(payload).await,
    }
}
