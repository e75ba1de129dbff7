use crate::config::SignalingConfig;
use crate::error::{ServiceError, StoreError};
use crate::room::RoomStore;
use crate::signaling::{ConnectionRegistry, DropReason};
use crate::transport::ConnectionHandle;
use huddle_core::{
    JoinRequest, JoinResponse, LeaveRequest, MessageKind, Room, RoomId, SignalingMessage, User,
    UserId,
};
use std::future::Future;
use std::pin::pin;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

/// How a connection loop ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// The peer went away or the transport failed.
    Disconnected,
    /// [`SignalingService::shutdown`] was called.
    Shutdown,
    /// The caller's cancellation future completed.
    Cancelled,
    /// The user was not a member of the room when the connection arrived.
    Rejected,
}

struct SignalingInner {
    store: Arc<RoomStore>,
    registry: ConnectionRegistry,
    config: SignalingConfig,
    shutdown: watch::Sender<bool>,
}

/// Room operations for the HTTP boundary and the per-connection relay loop
/// for the streaming boundary. Cheap to clone.
#[derive(Clone)]
pub struct SignalingService {
    inner: Arc<SignalingInner>,
}

impl SignalingService {
    pub fn new(store: Arc<RoomStore>, registry: ConnectionRegistry, config: SignalingConfig) -> Self {
        let (shutdown, _) = watch::channel(false);

        Self {
            inner: Arc::new(SignalingInner {
                store,
                registry,
                config,
                shutdown,
            }),
        }
    }

    pub fn store(&self) -> &RoomStore {
        &self.inner.store
    }

    pub fn registry(&self) -> &ConnectionRegistry {
        &self.inner.registry
    }

    /// Join an existing room, or create one when `room_id` is empty.
    pub fn join(&self, req: JoinRequest) -> Result<JoinResponse, ServiceError> {
        if req.user_name.is_empty() {
            return Err(ServiceError::required("user_name"));
        }

        let store = &self.inner.store;

        let room_id = if req.room_id.is_empty() {
            let room_id = RoomId::generate();
            // A fresh id can only collide through a broken generator.
            store
                .create_room(Room::new(room_id.clone()))
                .map_err(ServiceError::internal("failed to create room"))?;
            room_id
        } else {
            req.room_id
        };

        let user_id = UserId::generate();
        store
            .add_user(&room_id, User::new(user_id.clone(), req.user_name))
            .map_err(|e| match e {
                StoreError::RoomNotFound(room_id) => ServiceError::RoomNotFound(room_id),
                source => ServiceError::store("failed to add user")(source),
            })?;

        // Rooms are never removed, so the one just joined must still exist.
        let users_in_room = store
            .list_users(&room_id)
            .map_err(ServiceError::internal("failed to list users"))?
            .into_iter()
            .map(|user| user.user_name)
            .collect();

        info!(room_id = %room_id, user_id = %user_id, "User joined room");

        Ok(JoinResponse {
            room_id,
            user_id,
            users_in_room,
        })
    }

    /// Marks the user offline, then removes it. The two steps are independent:
    /// a failure in the second leaves the first applied.
    pub fn leave(&self, req: LeaveRequest) -> Result<(), ServiceError> {
        if req.room_id.is_empty() {
            return Err(ServiceError::required("room_id"));
        }
        if req.user_id.is_empty() {
            return Err(ServiceError::required("user_id"));
        }

        let store = &self.inner.store;
        store
            .set_online(&req.room_id, &req.user_id, false)
            .map_err(ServiceError::store("failed to set user offline"))?;
        store
            .remove_user(&req.room_id, &req.user_id)
            .map_err(ServiceError::store("failed to remove user"))?;

        info!(room_id = %req.room_id, user_id = %req.user_id, "User left room");
        Ok(())
    }

    /// Snapshot of the room; `Ok(None)` when it does not exist.
    pub fn get_info(&self, room_id: &RoomId) -> Result<Option<Room>, ServiceError> {
        if room_id.is_empty() {
            return Err(ServiceError::required("room_id"));
        }

        Ok(self.inner.store.get_room(room_id))
    }

    /// Names of members currently flagged online.
    pub fn get_online_users(&self, room_id: &RoomId) -> Result<Vec<String>, ServiceError> {
        if room_id.is_empty() {
            return Err(ServiceError::required("room_id"));
        }

        let users = self
            .inner
            .store
            .list_users(room_id)
            .map_err(ServiceError::store("failed to list users"))?;

        Ok(users
            .into_iter()
            .filter(|user| user.is_online)
            .map(|user| user.user_name)
            .collect())
    }

    /// Signal every connection loop to close. Idempotent.
    pub fn shutdown(&self) {
        let first = !self.inner.shutdown.send_replace(true);
        if first {
            info!("Signaling shutdown requested");
        }
    }

    pub fn is_shutting_down(&self) -> bool {
        *self.inner.shutdown.borrow()
    }

    /// Drive one signaling connection until it closes.
    ///
    /// Registers `conn`, marks the user online, announces it to the room and
    /// relays inbound messages until the peer disconnects, the service shuts
    /// down or `cancel` completes. Teardown always runs before returning,
    /// except for rejected connections which never became active. A
    /// connection replaced by a newer one for the same user leaves presence
    /// to its successor.
    pub async fn handle_connection<F>(
        &self,
        conn: ConnectionHandle,
        room_id: RoomId,
        user_id: UserId,
        cancel: F,
    ) -> CloseReason
    where
        F: Future<Output = ()> + Send,
    {
        let inner = &self.inner;
        let mut shutdown = inner.shutdown.subscribe();

        if *shutdown.borrow() {
            conn.close().await;
            return CloseReason::Shutdown;
        }

        inner.registry.register(&room_id, &user_id, Arc::clone(&conn));

        if let Err(e) = inner.store.set_online(&room_id, &user_id, true) {
            warn!(room_id = %room_id, user_id = %user_id, "Rejecting connection: {}", e);
            inner.registry.unregister(&room_id, &user_id, &conn);
            conn.close().await;
            return CloseReason::Rejected;
        }

        let mut cancel = pin!(cancel);
        let delay = inner.config.user_join_delay();

        let reason = 'active: {
            if !delay.is_zero() {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => break 'active CloseReason::Shutdown,
                    _ = &mut cancel => break 'active CloseReason::Cancelled,
                    _ = tokio::time::sleep(delay) => {}
                }
            }

            tokio::select! {
                biased;
                _ = wait_for_shutdown(&mut shutdown) => break 'active CloseReason::Shutdown,
                _ = &mut cancel => break 'active CloseReason::Cancelled,
                _ = self.announce_join(&room_id, &user_id) => {}
            }

            loop {
                tokio::select! {
                    biased;
                    _ = wait_for_shutdown(&mut shutdown) => break 'active CloseReason::Shutdown,
                    _ = &mut cancel => break 'active CloseReason::Cancelled,
                    open = self.relay_next(&conn, &room_id, &user_id) => {
                        if !open {
                            break 'active CloseReason::Disconnected;
                        }
                    }
                }
            }
        };

        self.teardown(&conn, &room_id, &user_id).await;
        info!(room_id = %room_id, user_id = %user_id, ?reason, "Connection closed");

        reason
    }

    async fn announce_join(&self, room_id: &RoomId, user_id: &UserId) {
        let user_name = self
            .inner
            .store
            .get_room(room_id)
            .and_then(|room| room.user(user_id).map(|user| user.user_name.clone()))
            .unwrap_or_default();

        let msg = SignalingMessage::user_joined(user_id, &user_name);
        if let Err(e) = self.inner.registry.broadcast(room_id, &msg, Some(user_id)).await {
            debug!(room_id = %room_id, "user_joined not delivered: {}", e);
        }
    }

    /// Read and relay one inbound message. Returns `false` once the
    /// connection is gone.
    async fn relay_next(&self, conn: &ConnectionHandle, room_id: &RoomId, user_id: &UserId) -> bool {
        let Some(payload) = conn.receive().await else {
            return false;
        };

        self.dispatch(room_id, user_id, &payload).await;
        true
    }

    async fn dispatch(&self, room_id: &RoomId, user_id: &UserId, payload: &[u8]) {
        let registry = &self.inner.registry;
        let observer = registry.observer();

        let msg: SignalingMessage = match serde_json::from_slice(payload) {
            Ok(msg) => msg,
            Err(e) => {
                debug!(user_id = %user_id, "Malformed signaling message: {}", e);
                observer.on_message_dropped(room_id, user_id, DropReason::Malformed);
                return;
            }
        };

        match msg.kind {
            kind if kind.is_point_to_point() => {
                let Some(to) = msg.recipient().cloned() else {
                    observer.on_message_dropped(room_id, user_id, DropReason::MissingRecipient);
                    return;
                };

                // The claimed sender is never trusted.
                let relayed = SignalingMessage::new(msg.kind, msg.data).with_from(user_id.clone());

                debug!(from = %user_id, to = %to, kind = ?relayed.kind, "Relaying");
                if let Err(e) = registry.send_to_user(room_id, &to, &relayed).await {
                    debug!(room_id = %room_id, "Relay to {} failed: {}", to, e);
                    observer.on_message_dropped(room_id, user_id, DropReason::RecipientUnavailable);
                }
            }
            MessageKind::UserLeft => {
                let msg = SignalingMessage::user_left(user_id);
                if let Err(e) = registry.broadcast(room_id, &msg, None).await {
                    debug!(room_id = %room_id, "user_left not delivered: {}", e);
                }
            }
            _ => {
                observer.on_message_dropped(room_id, user_id, DropReason::UnsupportedType);
            }
        }
    }

    async fn teardown(&self, conn: &ConnectionHandle, room_id: &RoomId, user_id: &UserId) {
        let inner = &self.inner;

        let current = inner.registry.unregister(room_id, user_id, conn);
        conn.close().await;

        if !current {
            debug!(room_id = %room_id, user_id = %user_id, "Connection was replaced, presence kept");
            return;
        }

        // The user may already have left through the HTTP boundary.
        if let Err(e) = inner.store.set_online(room_id, user_id, false) {
            debug!(room_id = %room_id, user_id = %user_id, "Offline update skipped: {}", e);
        }

        // Detached so a stalled recipient cannot hold the loop open.
        let service = self.clone();
        let room_id = room_id.clone();
        let user_id = user_id.clone();
        tokio::spawn(async move {
            let msg = SignalingMessage::user_left(&user_id);
            if let Err(e) = service
                .inner
                .registry
                .broadcast(&room_id, &msg, Some(&user_id))
                .await
            {
                debug!(room_id = %room_id, "user_left not delivered: {}", e);
            }
        });
    }
}

async fn wait_for_shutdown(rx: &mut watch::Receiver<bool>) {
    let _ = rx.wait_for(|stopped| *stopped).await;
}
