//! End-to-end tests against the compiled server over real pipes.

use std::process::Stdio;

use mcp_version_server::{
    client::{ClientError, StdioClient},
    config::DEFAULT_MAX_MESSAGE_BYTES,
    stdio::StdioTransport,
};
use serde_json::{json, Value};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

fn spawn_server() -> (Child, StdioClient<ChildStdout, ChildStdin>) {
    let mut child = Command::new(env!("CARGO_BIN_EXE_mcp-version-server"))
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .kill_on_drop(true)
        .spawn()
        .expect("spawn server");

    let stdin = child.stdin.take().expect("piped stdin");
    let stdout = child.stdout.take().expect("piped stdout");
    let client = StdioClient::new(StdioTransport::new(stdout, stdin, DEFAULT_MAX_MESSAGE_BYTES));
    (child, client)
}

async fn initialized_client() -> (Child, StdioClient<ChildStdout, ChildStdin>) {
    let (child, mut client) = spawn_server();
    client
        .initialize(
            "2025-06-18",
            json!({"name": "test-client", "version": "1.0.0"}),
            json!({
                "sampling": {"tools": {}, "context": {}},
                "roots": {"listChanged": true},
                "elicitation": {"form": {}, "url": {}}
            }),
        )
        .await
        .expect("initialize");
    (child, client)
}

#[tokio::test]
async fn initialize_returns_server_info() {
    let (_child, mut client) = spawn_server();

    let result = client
        .initialize("2025-06-18", json!({"name": "c", "version": "1"}), json!({}))
        .await
        .expect("initialize");

    assert_eq!(result["serverInfo"]["name"], "mcp-version-server");
    assert!(result["protocolVersion"].is_string());
}

#[tokio::test]
async fn protocol_version_reflects_handshake() {
    let (_child, mut client) = initialized_client().await;

    let text = client
        .call_tool("get_protocol_version", json!({}))
        .await
        .expect("call");
    let parsed: Value = serde_json::from_str(&text).expect("json text");

    assert_eq!(parsed["clientProtocolVersion"], "2025-06-18");
    assert!(parsed.get("serverLatestProtocolVersion").is_some());
    assert!(parsed.get("message").is_some());
}

#[tokio::test]
async fn capabilities_markdown_over_stdio() {
    let (_child, mut client) = initialized_client().await;

    let text = client
        .call_tool("get_client_capabilities", json!({}))
        .await
        .expect("call");

    assert!(text.contains("## Client Capabilities"));
    assert!(text.contains("**Client Name:** test-client"));
    assert!(text.contains("context inclusion, tool use"));
    assert!(text.contains("form mode, URL mode"));
    assert!(text.contains("| Experimental | Disabled |"));
}

#[tokio::test]
async fn capabilities_json_over_stdio() {
    let (_child, mut client) = initialized_client().await;

    let text = client
        .call_tool("get_client_capabilities", json!({"format": "json"}))
        .await
        .expect("call");
    let parsed: Value = serde_json::from_str(&text).expect("json text");

    assert!(parsed["capabilities"]["sampling"].is_object());
    assert!(parsed["capabilities"]["roots"].is_object());
    assert!(parsed["capabilities"]["elicitation"].is_object());
    assert_eq!(parsed["clientInfo"]["name"], "test-client");
}

#[tokio::test]
async fn queries_before_initialize_report_unknown() {
    let (_child, mut client) = spawn_server();

    let text = client
        .call_tool("get_protocol_version", json!({}))
        .await
        .expect("call");
    let parsed: Value = serde_json::from_str(&text).expect("json text");
    assert_eq!(parsed["clientProtocolVersion"], "unknown");
}

#[tokio::test]
async fn unknown_tool_fails_only_that_request() {
    let (_child, mut client) = initialized_client().await;

    let error = client
        .call_tool("unknown_tool", json!({}))
        .await
        .expect_err("unknown tool");
    assert!(matches!(error, ClientError::Rpc { code: -32601, .. }));

    let text = client
        .call_tool("get_protocol_version", json!({}))
        .await
        .expect("connection still usable");
    let parsed: Value = serde_json::from_str(&text).expect("json text");
    assert_eq!(parsed["clientProtocolVersion"], "2025-06-18");
}

#[tokio::test]
async fn server_exits_cleanly_on_eof() {
    let (mut child, client) = spawn_server();

    drop(client.into_writer());
    let status = child.wait().await.expect("wait");
    assert!(status.success());
}
