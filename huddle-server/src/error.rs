use huddle_core::{RoomId, UserId};
use std::time::Duration;
use thiserror::Error;

/// Failures of [`RoomStore`](crate::RoomStore) operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("room already exists: {0}")]
    RoomAlreadyExists(RoomId),

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("user {user_id} already exists in room {room_id}")]
    UserAlreadyExists { room_id: RoomId, user_id: UserId },

    #[error("user {user_id} not found in room {room_id}")]
    UserNotFound { room_id: RoomId, user_id: UserId },
}

/// Failure to hand one payload to one live connection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConnectionError {
    #[error("connection closed")]
    Closed,

    #[error("delivery timed out after {0:?}")]
    Timeout(Duration),

    #[error("transport error: {0}")]
    Transport(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("room has no connections: {0}")]
    RoomHasNoConnections(RoomId),

    #[error("user {user_id} is not connected to room {room_id}")]
    UserNotConnected { room_id: RoomId, user_id: UserId },

    #[error("failed to encode message: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("delivery to {user_id} failed: {source}")]
    Delivery {
        user_id: UserId,
        #[source]
        source: ConnectionError,
    },
}

/// Caller-facing classification used for status-code mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Internal,
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("validation error: {field} {reason}")]
    Validation {
        field: &'static str,
        reason: &'static str,
    },

    #[error("room not found: {0}")]
    RoomNotFound(RoomId),

    #[error("{context}: {source}")]
    Store {
        context: &'static str,
        #[source]
        source: StoreError,
    },

    /// A store failure that contradicts the relay's own invariants.
    #[error("internal error: {context}: {source}")]
    Internal {
        context: &'static str,
        #[source]
        source: StoreError,
    },
}

impl ServiceError {
    pub(crate) fn required(field: &'static str) -> Self {
        Self::Validation {
            field,
            reason: "is required",
        }
    }

    pub(crate) fn store(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Store { context, source }
    }

    pub(crate) fn internal(context: &'static str) -> impl FnOnce(StoreError) -> Self {
        move |source| Self::Internal { context, source }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation { .. } => ErrorKind::Validation,
            Self::RoomNotFound(_) => ErrorKind::NotFound,
            Self::Internal { .. } => ErrorKind::Internal,
            Self::Store { source, .. } => match source {
                StoreError::RoomNotFound(_) | StoreError::UserNotFound { .. } => {
                    ErrorKind::NotFound
                }
                StoreError::RoomAlreadyExists(_) | StoreError::UserAlreadyExists { .. } => {
                    ErrorKind::Conflict
                }
            },
        }
    }
}
