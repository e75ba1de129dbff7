use huddle_core::RoomId;
use huddle_server::CloseReason;

use crate::integration::{connect_peer, create_test_service, init_tracing, join, spawn_peer};

#[tokio::test]
async fn test_shutdown_closes_connections() {
    init_tracing();

    let (service, _observer) = create_test_service();
    let alice = join(&service, &RoomId::default(), "alice");
    let bob = join(&service, &alice.room_id, "bob");

    let alice_peer = connect_peer(&service, &alice.room_id, &alice.user_id).await;
    let bob_peer = connect_peer(&service, &bob.room_id, &bob.user_id).await;
    let alice_conn = alice_peer.conn.clone();

    service.shutdown();
    service.shutdown();
    assert!(service.is_shutting_down());

    assert_eq!(alice_peer.closed().await, CloseReason::Shutdown);
    assert_eq!(bob_peer.closed().await, CloseReason::Shutdown);

    assert!(alice_conn.is_closed());
    assert_eq!(service.registry().room_count(), 0);
    assert!(service.get_online_users(&alice.room_id).unwrap().is_empty());
}

#[tokio::test]
async fn test_connection_after_shutdown_closes_immediately() {
    init_tracing();

    let (service, _observer) = create_test_service();
    let alice = join(&service, &RoomId::default(), "alice");

    service.shutdown();

    let peer = spawn_peer(&service, &alice.room_id, &alice.user_id);
    let conn = peer.conn.clone();

    assert_eq!(peer.closed().await, CloseReason::Shutdown);
    assert!(conn.is_closed());
    assert!(!service.registry().is_connected(&alice.room_id, &alice.user_id));
    assert!(service.get_online_users(&alice.room_id).unwrap().is_empty());
}
