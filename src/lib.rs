use std::sync::Arc;

pub mod client;
pub mod config;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod mcp;
pub mod stdio;

use config::Config;
use domain::handshake::ConnectionState;
use stdio::{McpServer, StdioTransport, TransportError};

#[derive(Clone, Default)]
pub struct AppState {
    pub connection: Arc<ConnectionState>,
}

/// Serves one connection on the process's stdin/stdout until EOF.
pub async fn serve_stdio(config: &Config, state: AppState) -> Result<(), TransportError> {
    let transport = StdioTransport::new(
        tokio::io::stdin(),
        tokio::io::stdout(),
        config.max_message_bytes,
    );
    McpServer::new(transport, state).run().await
}
