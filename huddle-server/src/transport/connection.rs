use crate::error::ConnectionError;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

/// Bidirectional message channel that a transport (WebSocket, test double)
/// hands to the relay once the connection has been upgraded.
///
/// The relay reads from it on exactly one task and may write to it from many
/// tasks concurrently, so implementations take `&self` everywhere.
#[async_trait]
pub trait Connection: Send + Sync + 'static {
    /// Next inbound payload. `None` means the peer went away or the
    /// transport failed; the relay will not call `receive` again.
    async fn receive(&self) -> Option<Bytes>;

    /// Queue one outbound payload.
    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError>;

    async fn close(&self);
}

pub type ConnectionHandle = Arc<dyn Connection>;
