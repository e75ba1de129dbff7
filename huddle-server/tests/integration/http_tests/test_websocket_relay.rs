use anyhow::{Context, Result};
use futures::{SinkExt, StreamExt};
use huddle_core::{MessageKind, RoomId, SignalingMessage, UserId};
use huddle_server::SignalingService;
use serde_json::json;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use super::test_router;
use crate::integration::{create_test_service, init_tracing, join};
use crate::utils::{SETTLE_TIMEOUT_MS, SIGNAL_TIMEOUT_MS, wait_until};

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn serve(service: &SignalingService) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = test_router(service);

    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });

    addr
}

async fn open(addr: SocketAddr, room_id: &RoomId, user_id: &UserId) -> Client {
    let url = format!("ws://{addr}/api/room/{room_id}/ws?user_id={user_id}");
    let (client, _) = connect_async(url).await.expect("websocket handshake");
    client
}

async fn next_signal(client: &mut Client) -> Result<SignalingMessage> {
    let deadline = Duration::from_millis(SIGNAL_TIMEOUT_MS);

    loop {
        let frame = tokio::time::timeout(deadline, client.next())
            .await
            .context("Timeout waiting for frame")?
            .context("Socket closed")??;

        if let Message::Text(text) = frame {
            return serde_json::from_str(text.as_str()).context("Undecodable frame");
        }
    }
}

#[tokio::test]
async fn test_websocket_relay() {
    init_tracing();

    let (service, _observer) = create_test_service();
    let addr = serve(&service).await;

    let alice = join(&service, &RoomId::default(), "alice");
    let bob = join(&service, &alice.room_id, "bob");

    let mut alice_ws = open(addr, &alice.room_id, &alice.user_id).await;
    assert!(
        wait_until(
            || service.registry().is_connected(&alice.room_id, &alice.user_id),
            SETTLE_TIMEOUT_MS
        )
        .await
    );

    let mut bob_ws = open(addr, &bob.room_id, &bob.user_id).await;

    let joined = next_signal(&mut alice_ws).await.unwrap();
    assert_eq!(joined.kind, MessageKind::UserJoined);
    assert_eq!(joined.from, Some(bob.user_id.clone()));

    let offer = json!({ "type": "offer", "to": alice.user_id, "data": { "sdp": "v=0" } });
    bob_ws
        .send(Message::text(offer.to_string()))
        .await
        .unwrap();

    let relayed = next_signal(&mut alice_ws).await.unwrap();
    assert_eq!(relayed.kind, MessageKind::Offer);
    assert_eq!(relayed.from, Some(bob.user_id.clone()));
    assert_eq!(relayed.data, Some(json!({ "sdp": "v=0" })));

    bob_ws.close(None).await.unwrap();

    let left = next_signal(&mut alice_ws).await.unwrap();
    assert_eq!(left.kind, MessageKind::UserLeft);
    assert_eq!(left.from, Some(bob.user_id.clone()));

    assert!(
        wait_until(
            || service.get_online_users(&alice.room_id).unwrap() == vec!["alice".to_string()],
            SETTLE_TIMEOUT_MS
        )
        .await
    );
}
