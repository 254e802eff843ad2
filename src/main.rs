use mcp_version_server::{config::Config, logging, serve_stdio, AppState};
use tracing::info;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init_logging();

    let config = Config::from_env()?;
    let state = AppState::default();

    info!(
        version = env!("CARGO_PKG_VERSION"),
        max_message_bytes = config.max_message_bytes,
        "server starting"
    );

    serve_stdio(&config, state).await?;
    Ok(())
}
