pub mod api;
pub mod config;
pub mod error;
pub mod room;
pub mod signaling;
pub mod transport;

pub use api::*;
pub use config::*;
pub use error::*;
pub use room::*;
pub use signaling::*;
pub use transport::*;
