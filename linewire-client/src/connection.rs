//! Line-stream connection management
//!
//! Provides the TCP connection to a remote line-oriented peer with
//! automatic line framing and async dispatch.

mod client;
mod handler;

pub use client::{
    Connection, ConnectionBuilder, ConnectionState, DisconnectReason, DEFAULT_DIAL_TIMEOUT,
};
pub use handler::{CallbackHandler, LineHandler};
