//! Minimal MCP client used by the `version-client` binary and the process tests.

use serde_json::{json, Value};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tracing::debug;

use crate::stdio::{StdioTransport, TransportError};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid JSON from server: {0}")]
    Json(#[from] serde_json::Error),
    #[error("server closed the connection")]
    Closed,
    #[error("server returned error {code}: {message}")]
    Rpc { code: i64, message: String },
}

pub struct StdioClient<R, W> {
    transport: StdioTransport<R, W>,
    next_id: i64,
}

impl<R, W> StdioClient<R, W>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin,
{
    pub fn new(transport: StdioTransport<R, W>) -> Self {
        Self {
            transport,
            next_id: 1,
        }
    }

    pub async fn initialize(
        &mut self,
        protocol_version: &str,
        client_info: Value,
        capabilities: Value,
    ) -> Result<Value, ClientError> {
        let result = self
            .request(
                "initialize",
                json!({
                    "protocolVersion": protocol_version,
                    "capabilities": capabilities,
                    "clientInfo": client_info,
                }),
            )
            .await?;
        self.notify("notifications/initialized").await?;
        Ok(result)
    }

    /// Sends a request and waits for the response carrying the same id.
    pub async fn request(&mut self, method: &str, params: Value) -> Result<Value, ClientError> {
        let id = self.next_id;
        self.next_id += 1;

        let message = json!({"jsonrpc": "2.0", "id": id, "method": method, "params": params});
        self.transport.write_line(&message.to_string()).await?;

        loop {
            let Some(line) = self.transport.read_line().await? else {
                return Err(ClientError::Closed);
            };
            if line.is_empty() {
                continue;
            }

            let response: Value = serde_json::from_str(&line)?;
            if response["id"] != id {
                debug!(line = %line, "skipping unrelated message");
                continue;
            }

            if let Some(error) = response.get("error") {
                return Err(ClientError::Rpc {
                    code: error["code"].as_i64().unwrap_or_default(),
                    message: error["message"].as_str().unwrap_or_default().to_string(),
                });
            }
            return Ok(response["result"].clone());
        }
    }

    pub async fn notify(&mut self, method: &str) -> Result<(), ClientError> {
        let message = json!({"jsonrpc": "2.0", "method": method});
        self.transport.write_line(&message.to_string()).await?;
        Ok(())
    }

    /// Calls a tool and returns its first text block, or the whole result
    /// pretty-printed when there is none.
    pub async fn call_tool(&mut self, name: &str, arguments: Value) -> Result<String, ClientError> {
        let result = self
            .request("tools/call", json!({"name": name, "arguments": arguments}))
            .await?;

        let text = result["content"]
            .as_array()
            .and_then(|blocks| blocks.iter().find(|block| block["type"] == "text"))
            .and_then(|block| block["text"].as_str())
            .map(str::to_string);

        match text {
            Some(text) => Ok(text),
            None => Ok(serde_json::to_string_pretty(&result)?),
        }
    }

    /// Drops the read half and hands back the writer so the caller can close it.
    pub fn into_writer(self) -> W {
        self.transport.into_writer()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn request_skips_unrelated_lines_and_returns_result() {
        let input = concat!(
            "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/message"}"#,
            "\n",
            r#"{"jsonrpc":"2.0","id":1,"result":{"ok":true}}"#,
            "\n",
        );
        let mut client = StdioClient::new(StdioTransport::new(input.as_bytes(), Vec::new(), 1024));

        let result = client.request("ping", json!({})).await.expect("response");
        assert_eq!(result, json!({"ok": true}));

        let sent = String::from_utf8(client.into_writer()).expect("utf8");
        let request: Value = serde_json::from_str(sent.trim()).expect("json");
        assert_eq!(request["method"], "ping");
        assert_eq!(request["id"], 1);
    }

    #[tokio::test]
    async fn error_response_becomes_rpc_error() {
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"error":{"code":-32601,"message":"Method not found"}}"#,
            "\n",
        );
        let mut client = StdioClient::new(StdioTransport::new(input.as_bytes(), Vec::new(), 1024));

        let error = client
            .call_tool("unknown_tool", json!({}))
            .await
            .expect_err("error response");
        assert!(matches!(error, ClientError::Rpc { code: -32601, .. }));
    }

    #[tokio::test]
    async fn eof_before_response_is_closed() {
        let mut client = StdioClient::new(StdioTransport::new(&b""[..], Vec::new(), 1024));

        let error = client.request("ping", json!({})).await.expect_err("closed");
        assert!(matches!(error, ClientError::Closed));
    }
}
