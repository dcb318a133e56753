//! The device's binary wire protocol: request/response framing, command
//! identifiers, and the fixed-layout records exchanged over the transport.

pub mod codec;
pub mod commands;
pub mod wire;

pub use commands::{read_frame, write_request, CommandId, RawFrame, ResponseFrame, StreamTag};
