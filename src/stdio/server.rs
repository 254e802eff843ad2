//! MCP server loop over the line-delimited transport.
//!
//! Requests are handled strictly one after another: a line is read, routed
//! and answered before the next line is read.

use serde_json::Value;
use tracing::{error, info, warn};

use crate::mcp::rpc::{json_rpc_error, INVALID_REQUEST, PARSE_ERROR};
use crate::mcp::server::handle_json_rpc_value;
use crate::stdio::error::TransportError;
use crate::stdio::transport::StdioTransport;
use crate::AppState;

pub struct McpServer<R, W> {
    transport: StdioTransport<R, W>,
    state: AppState,
}

impl<R, W> McpServer<R, W>
where
    R: tokio::io::AsyncRead + Unpin,
    W: tokio::io::AsyncWrite + Unpin,
{
    pub fn new(transport: StdioTransport<R, W>, state: AppState) -> Self {
        Self { transport, state }
    }

    /// Runs until stdin reaches EOF or the transport fails.
    pub async fn run(&mut self) -> Result<(), TransportError> {
        info!("MCP server running on stdio");

        loop {
            let line = match self.transport.read_line().await {
                Ok(Some(line)) if line.is_empty() => continue,
                Ok(Some(line)) => line,
                Ok(None) => {
                    info!("stdin closed, shutting down");
                    return Ok(());
                }
                Err(err) if err.is_recoverable() => {
                    warn!(error = %err, "discarding unreadable message");
                    let code = match err {
                        TransportError::InvalidEncoding => PARSE_ERROR,
                        _ => INVALID_REQUEST,
                    };
                    let response = json_rpc_error(None, code, &err.to_string());
                    self.write_value(&response).await?;
                    continue;
                }
                Err(err) => return Err(err),
            };

            if let Some(response) = self.handle_line(&line) {
                self.write_value(&response).await?;
            }
        }
    }

    pub fn into_transport(self) -> StdioTransport<R, W> {
        self.transport
    }

    fn handle_line(&self, line: &str) -> Option<Value> {
        let payload: Value = match serde_json::from_str(line) {
            Ok(value) => value,
            Err(err) => {
                warn!(error = %err, "failed to parse JSON-RPC message");
                return Some(json_rpc_error(None, PARSE_ERROR, "Parse error"));
            }
        };

        let batch = match payload {
            Value::Array(batch) => batch,
            single => return handle_json_rpc_value(&self.state, single),
        };

        if batch.is_empty() {
            return Some(Value::Array(vec![json_rpc_error(
                None,
                INVALID_REQUEST,
                "Invalid Request",
            )]));
        }

        let responses = batch
            .into_iter()
            .filter_map(|item| handle_json_rpc_value(&self.state, item))
            .collect::<Vec<_>>();

        (!responses.is_empty()).then_some(Value::Array(responses))
    }

    async fn write_value(&mut self, response: &Value) -> Result<(), TransportError> {
        match serde_json::to_string(response) {
            Ok(json) => self.transport.write_line(&json).await,
            Err(err) => {
                error!(error = %err, "failed to serialize response");
                Err(TransportError::Write(err.to_string()))
            }
        }
    }
}
