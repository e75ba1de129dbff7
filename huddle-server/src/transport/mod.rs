mod connection;
mod transport_config;
mod ws_connection;

pub use connection::*;
pub use transport_config::*;
pub use ws_connection::*;
