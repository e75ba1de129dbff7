mod connection_registry;
mod delivery_observer;
mod signaling_service;

pub use connection_registry::*;
pub use delivery_observer::*;
pub use signaling_service::*;
