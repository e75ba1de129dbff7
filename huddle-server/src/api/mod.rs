mod api_error;
mod room_handlers;
mod routes;
mod ws_handler;

pub use api_error::*;
pub use room_handlers::*;
pub use routes::*;
pub use ws_handler::*;
