use anyhow::{Context, Result};
use bytes::Bytes;
use huddle_core::{MessageKind, SignalingMessage};
use std::time::{Duration, Instant};
use tokio::sync::mpsc;

/// Timeout for a relayed message to arrive (ms).
pub const SIGNAL_TIMEOUT_MS: u64 = 2000;

/// How long to watch a channel before concluding nothing arrives (ms).
pub const QUIET_PERIOD_MS: u64 = 150;

/// Timeout for relay state (registration, presence) to settle (ms).
pub const SETTLE_TIMEOUT_MS: u64 = 2000;

/// Receive and decode the next message sent to a connection.
pub async fn recv_message(
    rx: &mut mpsc::UnboundedReceiver<Bytes>,
    timeout_ms: u64,
) -> Result<SignalingMessage> {
    let payload = tokio::time::timeout(Duration::from_millis(timeout_ms), rx.recv())
        .await
        .context("Timeout waiting for message")?
        .context("Connection channel closed")?;

    serde_json::from_slice(&payload).context("Relay sent an undecodable message")
}

/// Skip messages until one of `kind` arrives.
pub async fn wait_for_kind(
    rx: &mut mpsc::UnboundedReceiver<Bytes>,
    kind: MessageKind,
    timeout_ms: u64,
) -> Result<SignalingMessage> {
    let deadline = Instant::now() + Duration::from_millis(timeout_ms);

    loop {
        let remaining = deadline.saturating_duration_since(Instant::now());
        if remaining.is_zero() {
            anyhow::bail!("Timeout waiting for {:?}", kind);
        }

        let msg = recv_message(rx, remaining.as_millis() as u64).await?;
        if msg.kind == kind {
            return Ok(msg);
        }
        tracing::debug!("[SignalHelper] Skipping {:?}", msg.kind);
    }
}

/// Fail if anything arrives within `quiet_ms`.
pub async fn assert_no_message(rx: &mut mpsc::UnboundedReceiver<Bytes>, quiet_ms: u64) {
    if let Ok(Some(payload)) =
        tokio::time::timeout(Duration::from_millis(quiet_ms), rx.recv()).await
    {
        panic!(
            "Expected no message, got {}",
            String::from_utf8_lossy(&payload)
        );
    }
}

/// Poll `condition` until it holds or the timeout expires.
pub async fn wait_until(condition: impl Fn() -> bool, timeout_ms: u64) -> bool {
    let start = Instant::now();
    let timeout = Duration::from_millis(timeout_ms);

    while start.elapsed() < timeout {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    condition()
}
