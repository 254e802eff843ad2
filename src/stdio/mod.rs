//! Stdio transport for the Model Context Protocol
//!
//! Line-delimited JSON framing and the sequential server loop built on it.

pub mod error;
pub mod server;
pub mod transport;

pub use error::TransportError;
pub use server::McpServer;
pub use transport::StdioTransport;
