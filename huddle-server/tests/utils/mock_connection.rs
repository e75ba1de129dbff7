use async_trait::async_trait;
use bytes::Bytes;
use huddle_server::{Connection, ConnectionError};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use tokio::sync::{Mutex, mpsc};

const SEND_OK: u8 = 0;
const SEND_FAIL: u8 = 1;
const SEND_STALL: u8 = 2;

/// In-memory [`Connection`].
///
/// Inbound traffic is scripted with [`push_json`](Self::push_json) and
/// friends; everything the relay sends comes out of the receiver returned by
/// [`new`](Self::new).
pub struct MockConnection {
    inbound_tx: mpsc::UnboundedSender<Option<Bytes>>,
    inbound_rx: Mutex<mpsc::UnboundedReceiver<Option<Bytes>>>,
    outbound_tx: mpsc::UnboundedSender<Bytes>,
    send_mode: AtomicU8,
    closed: AtomicBool,
}

impl MockConnection {
    /// Create a connection and the receiver for everything sent to it.
    pub fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Bytes>) {
        let (inbound_tx, inbound_rx) = mpsc::unbounded_channel();
        let (outbound_tx, outbound_rx) = mpsc::unbounded_channel();

        let conn = Arc::new(Self {
            inbound_tx,
            inbound_rx: Mutex::new(inbound_rx),
            outbound_tx,
            send_mode: AtomicU8::new(SEND_OK),
            closed: AtomicBool::new(false),
        });

        (conn, outbound_rx)
    }

    /// Queue an inbound JSON message.
    pub fn push_json(&self, value: serde_json::Value) {
        self.push_raw(value.to_string());
    }

    pub fn push_raw(&self, payload: impl Into<Bytes>) {
        let _ = self.inbound_tx.send(Some(payload.into()));
    }

    /// Simulate the peer going away.
    pub fn disconnect(&self) {
        let _ = self.inbound_tx.send(None);
    }

    /// Every subsequent send fails with a transport error.
    pub fn fail_sends(&self) {
        self.send_mode.store(SEND_FAIL, Ordering::SeqCst);
    }

    /// Every subsequent send never completes.
    pub fn stall_sends(&self) {
        self.send_mode.store(SEND_STALL, Ordering::SeqCst);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Connection for MockConnection {
    async fn receive(&self) -> Option<Bytes> {
        self.inbound_rx.lock().await.recv().await.flatten()
    }

    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError> {
        if self.is_closed() {
            return Err(ConnectionError::Closed);
        }

        match self.send_mode.load(Ordering::SeqCst) {
            SEND_FAIL => Err(ConnectionError::Transport("injected failure".into())),
            SEND_STALL => std::future::pending().await,
            _ => self
                .outbound_tx
                .send(payload)
                .map_err(|_| ConnectionError::Closed),
        }
    }

    async fn close(&self) {
        tracing::debug!("[MockConnection] close");
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_connection_roundtrip() {
        let (conn, mut rx) = MockConnection::new();

        conn.push_raw("hello");
        assert_eq!(conn.receive().await, Some(Bytes::from("hello")));

        conn.send(Bytes::from("out")).await.unwrap();
        assert_eq!(rx.recv().await, Some(Bytes::from("out")));

        conn.disconnect();
        assert_eq!(conn.receive().await, None);
    }

    #[tokio::test]
    async fn test_mock_connection_refuses_after_close() {
        let (conn, _rx) = MockConnection::new();

        conn.close().await;

        assert!(conn.is_closed());
        assert_eq!(
            conn.send(Bytes::from("late")).await,
            Err(ConnectionError::Closed)
        );
    }
}
