use crate::api::{ApiError, AppState};
use crate::signaling::SignalingService;
use crate::transport::{ConnectionHandle, TransportConfig, WsConnection};
use axum::extract::ws::WebSocket;
use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::response::{IntoResponse, Response};
use huddle_core::{RoomId, UserId};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Deserialize)]
pub struct WsParams {
    #[serde(default)]
    pub user_id: UserId,
}

pub async fn ws_handler(
    Path(room_id): Path<RoomId>,
    Query(params): Query<WsParams>,
    State(state): State<AppState>,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Response {
    if params.user_id.is_empty() {
        return ApiError::BadRequest("user_id is required").into_response();
    }

    let ws = match ws {
        Ok(ws) => ws,
        Err(rejection) => return rejection.into_response(),
    };

    let AppState { service, transport } = state;
    let user_id = params.user_id;

    ws.read_buffer_size(transport.read_buffer_size)
        .write_buffer_size(transport.write_buffer_size)
        .max_message_size(transport.max_message_size)
        .on_upgrade(move |socket| handle_socket(socket, room_id, user_id, service, transport))
}

async fn handle_socket(
    socket: WebSocket,
    room_id: RoomId,
    user_id: UserId,
    service: SignalingService,
    transport: TransportConfig,
) {
    info!(room_id = %room_id, user_id = %user_id, "New WebSocket connection");

    let conn: ConnectionHandle = Arc::new(WsConnection::new(socket, &transport));
    let reason = service
        .handle_connection(conn, room_id, user_id, std::future::pending::<()>())
        .await;

    debug!(?reason, "WebSocket handler finished");
}
