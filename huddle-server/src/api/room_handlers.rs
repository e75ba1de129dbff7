use crate::api::{ApiError, AppState};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use huddle_core::{JoinRequest, JoinResponse, LeaveRequest, OnlineUsersResponse, Room, RoomId};
use serde_json::{Value, json};

pub async fn join_room(
    State(state): State<AppState>,
    payload: Result<Json<JoinRequest>, JsonRejection>,
) -> Result<Json<JoinResponse>, ApiError> {
    let Json(req) = payload?;
    Ok(Json(state.service.join(req)?))
}

pub async fn leave_room(
    State(state): State<AppState>,
    payload: Result<Json<LeaveRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(req) = payload?;
    state.service.leave(req)?;
    Ok(Json(json!({ "message": "success" })))
}

pub async fn room_info(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<Room>, ApiError> {
    state
        .service
        .get_info(&room_id)?
        .map(Json)
        .ok_or(ApiError::NotFound("room not found"))
}

pub async fn online_users(
    State(state): State<AppState>,
    Path(room_id): Path<RoomId>,
) -> Result<Json<OnlineUsersResponse>, ApiError> {
    let users = state.service.get_online_users(&room_id)?;
    Ok(Json(OnlineUsersResponse { room_id, users }))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "rooms": state.service.store().room_count(),
    }))
}
