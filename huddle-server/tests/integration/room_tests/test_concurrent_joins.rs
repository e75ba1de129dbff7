use huddle_core::{JoinRequest, RoomId};
use std::collections::HashSet;

use crate::integration::{create_test_service, init_tracing, join};

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_joins() {
    init_tracing();

    let (service, _observer) = create_test_service();
    let host = join(&service, &RoomId::default(), "host");

    let handles: Vec<_> = (0..32)
        .map(|i| {
            let service = service.clone();
            let room_id = host.room_id.clone();
            tokio::spawn(async move {
                let user_name = format!("guest{i}");
                let resp = service
                    .join(JoinRequest {
                        room_id,
                        user_name: user_name.clone(),
                    })
                    .expect("join failed");
                (user_name, resp)
            })
        })
        .collect();

    let mut ids = HashSet::new();
    ids.insert(host.user_id.clone());

    for handle in handles {
        let (user_name, resp) = handle.await.unwrap();
        assert_eq!(resp.room_id, host.room_id);

        // Every snapshot reflects at least the host and the joiner itself.
        assert!(resp.users_in_room.contains(&"host".to_string()));
        assert!(resp.users_in_room.contains(&user_name));

        assert!(ids.insert(resp.user_id), "duplicate user id");
    }

    let room = service.get_info(&host.room_id).unwrap().unwrap();
    assert_eq!(room.users.len(), 33);
    assert_eq!(ids.len(), 33);
}
