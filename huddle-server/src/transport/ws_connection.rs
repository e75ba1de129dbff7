use crate::error::ConnectionError;
use crate::transport::{Connection, TransportConfig};
use async_trait::async_trait;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use bytes::Bytes;
use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::sync::{Mutex, mpsc};
use tokio::time::{Instant, interval_at, timeout};
use tracing::{debug, warn};

/// [`Connection`] over an upgraded axum WebSocket.
///
/// Outbound frames are queued and written by a dedicated task, which also
/// sends keepalive pings. Inbound silence longer than `pong_wait` ends the
/// connection.
pub struct WsConnection {
    inbound: Mutex<SplitStream<WebSocket>>,
    outbound: mpsc::UnboundedSender<Message>,
    pong_wait: Duration,
}

impl WsConnection {
    pub fn new(socket: WebSocket, config: &TransportConfig) -> Self {
        let (sink, stream) = socket.split();
        let (tx, rx) = mpsc::unbounded_channel();

        tokio::spawn(write_loop(sink, rx, config.ping_period()));

        Self {
            inbound: Mutex::new(stream),
            outbound: tx,
            pong_wait: config.pong_wait(),
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut rx: mpsc::UnboundedReceiver<Message>,
    ping_period: Duration,
) {
    let period = ping_period.max(Duration::from_millis(1));
    let mut ping = interval_at(Instant::now() + period, period);

    loop {
        tokio::select! {
            msg = rx.recv() => {
                let Some(msg) = msg else { break };
                let closing = matches!(msg, Message::Close(_));

                if let Err(e) = sink.send(msg).await {
                    debug!("WebSocket write failed: {}", e);
                    break;
                }
                if closing {
                    break;
                }
            }
            _ = ping.tick() => {
                if sink.send(Message::Ping(Bytes::new())).await.is_err() {
                    break;
                }
            }
        }
    }

    let _ = sink.close().await;
}

#[async_trait]
impl Connection for WsConnection {
    async fn receive(&self) -> Option<Bytes> {
        let mut stream = self.inbound.lock().await;

        loop {
            let next = match timeout(self.pong_wait, stream.next()).await {
                Ok(next) => next,
                Err(_) => {
                    warn!("No traffic for {:?}, dropping WebSocket", self.pong_wait);
                    return None;
                }
            };

            match next {
                Some(Ok(Message::Text(text))) => return Some(Bytes::from(text)),
                Some(Ok(Message::Binary(data))) => return Some(data),
                Some(Ok(Message::Ping(_) | Message::Pong(_))) => continue,
                Some(Ok(Message::Close(_))) | None => return None,
                Some(Err(e)) => {
                    debug!("WebSocket read failed: {}", e);
                    return None;
                }
            }
        }
    }

    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError> {
        // JSON goes out as text; anything else as binary.
        let msg = match Utf8Bytes::try_from(payload.clone()) {
            Ok(text) => Message::Text(text),
            Err(_) => Message::Binary(payload),
        };

        self.outbound
            .send(msg)
            .map_err(|_| ConnectionError::Closed)
    }

    async fn close(&self) {
        let _ = self.outbound.send(Message::Close(None));
    }
}
