pub mod commands;
pub mod handlers;
pub mod transport;

pub use commands::{Command, CommandDispatcher, CommandSettings};
pub use handlers::BotHandler;
pub use transport::{MessageTransport, TransportError};
