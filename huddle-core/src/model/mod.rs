mod ids;
mod request;
mod room;
mod signaling;
mod user;

pub use ids::{RoomId, UserId};
pub use request::{JoinRequest, JoinResponse, LeaveRequest, OnlineUsersResponse};
pub use room::Room;
pub use signaling::{MessageKind, SignalingMessage};
pub use user::User;
