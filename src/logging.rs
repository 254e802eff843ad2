use std::time::Instant;

use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. Output goes to stderr because stdout
/// carries the JSON-RPC stream.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
}

pub fn log_request_summary(method: &str, tool: Option<&str>, failed: bool, started_at: Instant) {
    let elapsed_ms = started_at.elapsed().as_millis();

    info!(
        method = %method,
        tool = tool.unwrap_or("-"),
        outcome = if failed { "failure" } else { "success" },
        duration_ms = elapsed_ms,
        "request summary"
    );

    if failed && tool.is_some() {
        warn!(method = %method, tool = tool.unwrap_or("-"), "tool call failed");
    }
}
