//! WebSocket conversation handlers.

pub mod messages;
pub mod session;

pub use messages::{IncomingMessage, OutgoingMessage};
pub use session::websocket_handler;
