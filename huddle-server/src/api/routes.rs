use crate::api::{health, join_room, leave_room, online_users, room_info, ws_handler};
use crate::signaling::SignalingService;
use crate::transport::TransportConfig;
use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Shared handler state.
#[derive(Clone)]
pub struct AppState {
    pub service: SignalingService,
    pub transport: TransportConfig,
}

impl AppState {
    pub fn new(service: SignalingService, transport: TransportConfig) -> Self {
        Self { service, transport }
    }
}

pub fn router(state: AppState) -> Router {
    // Browser clients are served from other origins.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/room/join", post(join_room))
        .route("/api/room/leave", post(leave_room))
        .route("/api/room/{room_id}/info", get(room_info))
        .route("/api/room/{room_id}/online", get(online_users))
        .route("/api/room/{room_id}/ws", get(ws_handler))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
