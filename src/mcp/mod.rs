//! Model Context Protocol (MCP) message handling
//!
//! JSON-RPC validation, method routing and envelope formatting.

pub mod rpc;
pub mod server;
