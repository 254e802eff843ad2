//! Tools exposed via Model Context Protocol
//!
//! `get_protocol_version` and `get_client_capabilities`, both answered from the
//! recorded handshake.

use rust_mcp_sdk::{
    macros,
    schema::{
        CallToolRequestParams, CallToolResult, ContentBlock, ListToolsResult, TextContent, Tool,
    },
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::domain::handshake::ConnectionState;
use crate::domain::report::{describe_capabilities, describe_protocol_version, OutputFormat};
use crate::errors::AppError;
use crate::mcp::rpc::{
    app_error_to_json_rpc, json_rpc_error, json_rpc_result_from, INVALID_PARAMS,
};
use crate::AppState;

pub const GET_PROTOCOL_VERSION: &str = "get_protocol_version";
pub const GET_CLIENT_CAPABILITIES: &str = "get_client_capabilities";

#[macros::mcp_tool(
    name = "get_protocol_version",
    description = "Returns the MCP protocol version negotiated by the connected client"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetProtocolVersionTool {}

#[macros::mcp_tool(
    name = "get_client_capabilities",
    description = "Describes the capabilities the connected client declared during initialization"
)]
#[derive(Debug, Deserialize, Serialize, macros::JsonSchema)]
pub struct GetClientCapabilitiesTool {
    /// Output format: "markdown" (default) or "json"
    pub format: Option<String>,
}

pub fn build_tools_list() -> Vec<Tool> {
    vec![GetProtocolVersionTool::tool(), GetClientCapabilitiesTool::tool()]
}

/// The `tools/list` result. The derived schema cannot express the `format`
/// enumeration, so that property is replaced after serialization.
pub fn build_tools_list_result() -> Result<Value, AppError> {
    let mut result = serde_json::to_value(ListToolsResult {
        meta: None,
        next_cursor: None,
        tools: build_tools_list(),
    })
    .map_err(|err| AppError::internal(format!("tools list serialization failed: {err}")))?;

    if let Some(tools) = result.get_mut("tools").and_then(Value::as_array_mut) {
        for tool in tools
            .iter_mut()
            .filter(|tool| tool["name"] == GET_CLIENT_CAPABILITIES)
        {
            if let Some(properties) = tool
                .pointer_mut("/inputSchema/properties")
                .and_then(Value::as_object_mut)
            {
                properties.insert("format".to_string(), format_property_schema());
            }
        }
    }

    Ok(result)
}

fn format_property_schema() -> Value {
    json!({
        "type": "string",
        "enum": ["markdown", "json"],
        "default": "markdown",
        "description": "Output format: a markdown table or the raw negotiated JSON"
    })
}

/// Routes a tool call to the reporter and returns the text to send back.
/// Never mutates the connection state.
pub fn call_tool(
    connection: &ConnectionState,
    name: &str,
    arguments: &Map<String, Value>,
) -> Result<String, AppError> {
    match name {
        GET_PROTOCOL_VERSION => describe_protocol_version(connection).render(),
        GET_CLIENT_CAPABILITIES => {
            let format = OutputFormat::from_argument(arguments.get("format"));
            describe_capabilities(connection, format)
        }
        _ => Err(AppError::unknown_tool(name)),
    }
}

pub fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> Value {
    let Some(raw_params) = params else {
        return json_rpc_error(id, INVALID_PARAMS, "Invalid params");
    };

    let tool_call: CallToolRequestParams = match serde_json::from_value(raw_params) {
        Ok(value) => value,
        Err(_) => return json_rpc_error(id, INVALID_PARAMS, "Invalid params"),
    };

    let arguments = tool_call.arguments.unwrap_or_default();
    match call_tool(&state.connection, &tool_call.name, &arguments) {
        Ok(text) => json_rpc_result_from(
            id,
            &CallToolResult {
                content: vec![ContentBlock::from(TextContent::new(text, None, None))],
                is_error: None,
                meta: None,
                structured_content: None,
            },
        ),
        Err(err) => app_error_to_json_rpc(id, err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lists_both_tools() {
        let names = build_tools_list()
            .into_iter()
            .map(|tool| tool.name)
            .collect::<Vec<_>>();

        assert_eq!(names, [GET_PROTOCOL_VERSION, GET_CLIENT_CAPABILITIES]);
    }

    #[test]
    fn capabilities_tool_schema_enumerates_formats() {
        let result = build_tools_list_result().expect("tools list");
        let tools = result["tools"].as_array().expect("tools array");

        let capabilities = tools
            .iter()
            .find(|tool| tool["name"] == GET_CLIENT_CAPABILITIES)
            .expect("capabilities tool listed");
        assert_eq!(capabilities["inputSchema"]["type"], "object");
        assert_eq!(
            capabilities["inputSchema"]["properties"]["format"]["enum"],
            json!(["markdown", "json"])
        );

        let version = tools
            .iter()
            .find(|tool| tool["name"] == GET_PROTOCOL_VERSION)
            .expect("version tool listed");
        assert_eq!(version["inputSchema"]["type"], "object");
        assert!(version["description"].is_string());
    }

    #[test]
    fn unknown_tool_is_rejected() {
        let error = call_tool(&ConnectionState::new(), "unknown_tool", &Map::new())
            .expect_err("unknown tool must fail");

        assert!(matches!(error, AppError::UnknownTool { ref name } if name == "unknown_tool"));
    }

    #[test]
    fn capabilities_tool_defaults_to_markdown() {
        let text = call_tool(&ConnectionState::new(), GET_CLIENT_CAPABILITIES, &Map::new())
            .expect("call succeeds");

        assert!(text.contains("no initialize handshake"));
    }
}
