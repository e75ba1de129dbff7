use huddle_core::{MessageKind, RoomId};
use serde_json::json;

use crate::integration::{connect_peer, create_test_service, init_tracing, join};
use crate::utils::{SIGNAL_TIMEOUT_MS, wait_for_kind};

#[tokio::test]
async fn test_user_left_from_client() {
    init_tracing();

    let (service, _observer) = create_test_service();
    let alice = join(&service, &RoomId::default(), "alice");
    let bob = join(&service, &alice.room_id, "bob");

    let mut alice_peer = connect_peer(&service, &alice.room_id, &alice.user_id).await;
    let mut bob_peer = connect_peer(&service, &bob.room_id, &bob.user_id).await;

    bob_peer.conn.push_json(json!({ "type": "user_left", "data": { "user_id": "forged" } }));

    // Everyone in the room hears it, including the sender.
    for rx in [&mut alice_peer.rx, &mut bob_peer.rx] {
        let left = wait_for_kind(rx, MessageKind::UserLeft, SIGNAL_TIMEOUT_MS)
            .await
            .unwrap();
        assert_eq!(left.from, Some(bob.user_id.clone()));
        assert_eq!(left.data, Some(json!({ "user_id": bob.user_id })));
    }

    // Announcing departure does not end the connection.
    assert!(service.registry().is_connected(&bob.room_id, &bob.user_id));
    assert!(!bob_peer.conn.is_closed());
}
