//! Spawns the server, performs a handshake with a sample capability set and
//! prints what the server reports back.
//!
//! Usage: `version-client [path-to-server]`

use std::{env, path::PathBuf, process::Stdio};

use mcp_version_server::{
    client::StdioClient, config::DEFAULT_MAX_MESSAGE_BYTES, logging, stdio::StdioTransport,
};
use serde_json::json;
use tokio::process::Command;
use tracing::info;

const CLIENT_PROTOCOL_VERSION: &str = "2025-11-25";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let server_path = match env::args_os().nth(1) {
        Some(path) => PathBuf::from(path),
        None => env::current_exe()?.with_file_name(format!(
            "mcp-version-server{}",
            env::consts::EXE_SUFFIX
        )),
    };
    info!(server = %server_path.display(), "spawning server");

    let mut child = Command::new(&server_path)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .kill_on_drop(true)
        .spawn()?;
    let stdin = child.stdin.take().ok_or("server stdin is not piped")?;
    let stdout = child.stdout.take().ok_or("server stdout is not piped")?;

    let mut client = StdioClient::new(StdioTransport::new(
        stdout,
        stdin,
        DEFAULT_MAX_MESSAGE_BYTES,
    ));
    client
        .initialize(
            CLIENT_PROTOCOL_VERSION,
            json!({"name": "version-client", "version": env!("CARGO_PKG_VERSION")}),
            json!({
                "sampling": {"context": {}, "tools": {}},
                "roots": {"listChanged": true},
                "elicitation": {"form": {}}
            }),
        )
        .await?;

    println!("=== Client Capabilities (Markdown) ===\n");
    let capabilities = client
        .call_tool("get_client_capabilities", json!({"format": "markdown"}))
        .await?;
    println!("{capabilities}");

    println!("\n=== Protocol Version ===\n");
    let version = client.call_tool("get_protocol_version", json!({})).await?;
    println!("{version}");

    // Closing stdin lets the server reach EOF and exit.
    drop(client.into_writer());
    let status = child.wait().await?;
    info!(%status, "server exited");
    Ok(())
}
