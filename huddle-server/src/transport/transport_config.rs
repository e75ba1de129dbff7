use serde::{Deserialize, Serialize};
use std::time::Duration;

/// WebSocket tuning for signaling connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransportConfig {
    pub read_buffer_size: usize,
    pub write_buffer_size: usize,
    pub max_message_size: usize,
    /// Interval between keepalive pings sent by the server.
    pub ping_period_secs: u64,
    /// Inbound silence after which the peer is considered gone.
    pub pong_wait_secs: u64,
}

impl TransportConfig {
    pub fn ping_period(&self) -> Duration {
        Duration::from_secs(self.ping_period_secs)
    }

    pub fn pong_wait(&self) -> Duration {
        Duration::from_secs(self.pong_wait_secs)
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            read_buffer_size: 1024,
            write_buffer_size: 1024,
            max_message_size: 512 * 1024,
            ping_period_secs: 54,
            pong_wait_secs: 60,
        }
    }
}
