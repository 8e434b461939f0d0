//! linewire-client: Client-side TCP line-stream connection
//!
//! Dial a remote endpoint with a bounded timeout, register line handlers,
//! then listen: a read task frames inbound bytes into text lines and hands
//! each one through a bounded queue to a dispatch task, which fans it out
//! to every handler in registration order.

pub mod connection;

pub use connection::{
    CallbackHandler, Connection, ConnectionBuilder, ConnectionState, DisconnectReason,
    LineHandler, DEFAULT_DIAL_TIMEOUT,
};

// Re-export the shared error surface
pub use linewire_utils::{Error, Result};
