//! linewire-protocol: Wire framing for newline-delimited text streams
//!
//! This crate defines the line codec used on both ends of a linewire
//! connection: inbound bytes are split on line feeds, outbound lines are
//! terminated with CRLF.

pub mod codec;

// Re-export main types at crate root
pub use codec::{CodecError, LineCodec, DEFAULT_MAX_LINE_LEN, LINE_TERMINATOR};
