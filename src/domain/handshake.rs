//! Handshake recorder
//!
//! Captures what the peer declared in `initialize` and answers with the
//! server's own fixed protocol version, capabilities and identity.

use std::sync::{Arc, PoisonError, RwLock};

use rust_mcp_sdk::schema::{
    Implementation, InitializeResult, ServerCapabilities, ServerCapabilitiesTools,
};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use crate::errors::AppError;

pub const LATEST_PROTOCOL_VERSION: &str = "2025-11-25";

/// Raw capability object as declared by the peer, key order preserved.
pub type CapabilitySet = Map<String, Value>;

/// Raw `clientInfo` object, reported back exactly as the peer sent it.
pub type ClientInfo = Map<String, Value>;

/// A string-valued identity field such as `name` or `version`.
pub fn identity_field<'a>(client_info: &'a ClientInfo, key: &str) -> Option<&'a str> {
    client_info.get(key).and_then(Value::as_str)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InitializeParams {
    pub protocol_version: String,
    #[serde(default)]
    pub capabilities: Option<CapabilitySet>,
    #[serde(default)]
    pub client_info: Option<ClientInfo>,
}

/// Everything captured from one `initialize` request. Stored as a unit so a
/// reader never sees fields from two different handshakes.
#[derive(Debug, Clone, PartialEq)]
pub struct Handshake {
    pub protocol_version: String,
    pub capabilities: CapabilitySet,
    pub client_info: ClientInfo,
}

impl From<InitializeParams> for Handshake {
    fn from(params: InitializeParams) -> Self {
        Self {
            protocol_version: params.protocol_version,
            capabilities: params.capabilities.unwrap_or_default(),
            client_info: params.client_info.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Default)]
pub struct ConnectionState {
    handshake: RwLock<Option<Arc<Handshake>>>,
}

impl ConnectionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces any previously recorded handshake.
    pub fn record(&self, handshake: Handshake) {
        let record = Arc::new(handshake);
        let mut slot = self
            .handshake
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        *slot = Some(record);
    }

    pub fn snapshot(&self) -> Option<Arc<Handshake>> {
        self.handshake
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

pub fn parse_initialize_params(params: Option<&Value>) -> Result<InitializeParams, AppError> {
    let Some(raw_params) = params else {
        return Err(AppError::bad_request(
            "invalid_initialize_params",
            "initialize params are required",
        ));
    };

    let parsed: InitializeParams = serde_json::from_value(raw_params.clone()).map_err(|err| {
        AppError::bad_request(
            "invalid_initialize_params",
            format!("initialize params are malformed: {err}"),
        )
    })?;

    if parsed.protocol_version.trim().is_empty() {
        return Err(AppError::bad_request(
            "invalid_protocol_version",
            "initialize params.protocolVersion is required",
        ));
    }

    Ok(parsed)
}

pub fn on_initialize(state: &ConnectionState, params: InitializeParams) -> InitializeResult {
    let handshake = Handshake::from(params);

    info!(
        client_name = identity_field(&handshake.client_info, "name").unwrap_or("unknown"),
        client_version = identity_field(&handshake.client_info, "version").unwrap_or("unknown"),
        protocol_version = %handshake.protocol_version,
        capabilities = handshake.capabilities.len(),
        "client handshake recorded"
    );
    state.record(handshake);

    server_initialize_result()
}

pub fn server_initialize_result() -> InitializeResult {
    InitializeResult {
        server_info: Implementation {
            name: env!("CARGO_PKG_NAME").to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            title: None,
            description: None,
            icons: vec![],
            website_url: None,
        },
        capabilities: ServerCapabilities {
            tools: Some(ServerCapabilitiesTools { list_changed: None }),
            ..Default::default()
        },
        protocol_version: LATEST_PROTOCOL_VERSION.to_string(),
        instructions: None,
        meta: None,
    }
}
