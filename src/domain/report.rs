//! Capability reporter
//!
//! Renders the recorded handshake either as a markdown status table or as the
//! raw negotiated JSON. Statuses are derived on every call.

use serde::Serialize;
use serde_json::Value;

use crate::domain::handshake::{
    identity_field, CapabilitySet, ClientInfo, ConnectionState, Handshake,
    LATEST_PROTOCOL_VERSION,
};
use crate::errors::AppError;

pub const UNKNOWN_PROTOCOL_VERSION: &str = "unknown";
pub const NO_HANDSHAKE_MESSAGE: &str =
    "Client capabilities are unavailable: no initialize handshake has been received yet.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Markdown,
    Json,
}

impl OutputFormat {
    /// Anything other than `"json"` falls back to markdown.
    pub fn from_argument(value: Option<&Value>) -> Self {
        match value
            .and_then(Value::as_str)
            .map(str::trim)
            .map(str::to_ascii_lowercase)
            .as_deref()
        {
            Some("json") => Self::Json,
            _ => Self::Markdown,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapabilityStatus {
    pub name: &'static str,
    pub enabled: bool,
    pub description: &'static str,
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProtocolVersionReport {
    pub client_protocol_version: String,
    pub server_latest_protocol_version: &'static str,
    pub message: String,
}

impl ProtocolVersionReport {
    pub fn render(&self) -> Result<String, AppError> {
        to_pretty_json(self)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CapabilityReport<'a> {
    client_info: Option<&'a ClientInfo>,
    capabilities: Option<&'a CapabilitySet>,
    protocol_version: &'a str,
}

pub fn describe_protocol_version(state: &ConnectionState) -> ProtocolVersionReport {
    let client_protocol_version = state
        .snapshot()
        .map(|handshake| handshake.protocol_version.clone())
        .unwrap_or_else(|| UNKNOWN_PROTOCOL_VERSION.to_string());

    ProtocolVersionReport {
        message: format!("MCP Protocol Version: {client_protocol_version}"),
        client_protocol_version,
        server_latest_protocol_version: LATEST_PROTOCOL_VERSION,
    }
}

pub fn describe_capabilities(
    state: &ConnectionState,
    format: OutputFormat,
) -> Result<String, AppError> {
    let snapshot = state.snapshot();
    let handshake = snapshot.as_deref();

    match format {
        OutputFormat::Markdown => Ok(render_markdown(handshake)),
        OutputFormat::Json => render_json(handshake),
    }
}

/// Fixed row order: Roots, Sampling, Elicitation, Experimental.
pub fn capability_statuses(capabilities: &CapabilitySet) -> Vec<CapabilityStatus> {
    let roots = declared(capabilities, "roots");
    let sampling = declared(capabilities, "sampling");
    let elicitation = declared(capabilities, "elicitation");
    let experimental = declared(capabilities, "experimental")
        .and_then(Value::as_object)
        .filter(|flags| !flags.is_empty());

    vec![
        CapabilityStatus {
            name: "Roots",
            enabled: roots.is_some(),
            description: "Filesystem roots exposed to the server",
            detail: roots
                .filter(|payload| flag(payload, "listChanged"))
                .map(|_| "listChanged notifications supported".to_string()),
        },
        CapabilityStatus {
            name: "Sampling",
            enabled: sampling.is_some(),
            description: "Server-initiated LLM sampling requests",
            detail: sampling.and_then(|payload| {
                join_details([
                    flag(payload, "context").then_some("context inclusion"),
                    flag(payload, "tools").then_some("tool use"),
                ])
            }),
        },
        CapabilityStatus {
            name: "Elicitation",
            enabled: elicitation.is_some(),
            description: "Server requests for additional user input",
            detail: elicitation.and_then(|payload| {
                join_details([
                    flag(payload, "form").then_some("form mode"),
                    flag(payload, "url").then_some("URL mode"),
                ])
            }),
        },
        CapabilityStatus {
            name: "Experimental",
            enabled: experimental.is_some(),
            description: "Non-standard experimental features",
            detail: experimental.map(|flags| {
                flags
                    .keys()
                    .map(String::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            }),
        },
    ]
}

pub fn render_markdown(handshake: Option<&Handshake>) -> String {
    let Some(handshake) = handshake else {
        return NO_HANDSHAKE_MESSAGE.to_string();
    };

    let client_name = identity_field(&handshake.client_info, "name").unwrap_or("Unknown");
    let client_version = identity_field(&handshake.client_info, "version").unwrap_or("Unknown");

    let mut output = String::from("## Client Capabilities\n\n");
    output.push_str(&format!("- **Client Name:** {client_name}\n"));
    output.push_str(&format!("- **Client Version:** {client_version}\n"));
    output.push_str(&format!(
        "- **Protocol Version:** {}\n\n",
        handshake.protocol_version
    ));
    output.push_str("| Capability | Status | Description | Details |\n");
    output.push_str("|------------|--------|-------------|---------|\n");

    for status in capability_statuses(&handshake.capabilities) {
        output.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            status.name,
            if status.enabled { "Enabled" } else { "Disabled" },
            status.description,
            status
                .detail
                .as_deref()
                .map(escape_cell)
                .unwrap_or_else(|| "-".to_string()),
        ));
    }

    output
}

pub fn render_json(handshake: Option<&Handshake>) -> Result<String, AppError> {
    let report = match handshake {
        Some(handshake) => CapabilityReport {
            client_info: Some(&handshake.client_info),
            capabilities: Some(&handshake.capabilities),
            protocol_version: &handshake.protocol_version,
        },
        None => CapabilityReport {
            client_info: None,
            capabilities: None,
            protocol_version: UNKNOWN_PROTOCOL_VERSION,
        },
    };

    to_pretty_json(&report)
}

fn declared<'a>(capabilities: &'a CapabilitySet, key: &str) -> Option<&'a Value> {
    capabilities.get(key).filter(|payload| !payload.is_null())
}

fn flag(payload: &Value, key: &str) -> bool {
    is_truthy(payload.get(key))
}

// Peers written against loosely typed SDKs send `{}` for "on", so any object
// counts as set.
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(enabled)) => *enabled,
        Some(Value::Number(number)) => number.as_f64().is_some_and(|n| n != 0.0 && !n.is_nan()),
        Some(Value::String(text)) => !text.is_empty(),
        Some(Value::Array(_)) | Some(Value::Object(_)) => true,
    }
}

fn join_details<const N: usize>(parts: [Option<&'static str>; N]) -> Option<String> {
    let parts = parts.into_iter().flatten().collect::<Vec<_>>();
    (!parts.is_empty()).then(|| parts.join(", "))
}

fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|").replace('\n', " ")
}

fn to_pretty_json<T: Serialize>(value: &T) -> Result<String, AppError> {
    serde_json::to_string_pretty(value)
        .map_err(|err| AppError::internal(format!("report serialization failed: {err}")))
}
