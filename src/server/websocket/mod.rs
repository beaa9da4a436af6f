//! WebSocket transport for MCP.
//!
//! One text frame carries one JSON-RPC message. Each connection is served
//! serially: a message is dispatched to completion and its reply written
//! before the next frame is read.

mod handler;

pub use handler::ws_handler;
