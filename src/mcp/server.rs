//! The central Model Context Protocol engine
//!
//! Decodes JSON-RPC messages, validates request shapes against the SDK schema
//! and routes `initialize`, `ping`, `tools/list` and `tools/call`.

use std::time::Instant;

use rust_mcp_sdk::schema::{
    CallToolRequest, JsonrpcMessage, JsonrpcRequest, ListToolsRequest, PingRequest,
};
use serde_json::{json, Value};
use tracing::debug;

use crate::domain::handshake::{on_initialize, parse_initialize_params};
use crate::domain::tools::{build_tools_list_result, handle_tools_call};
use crate::logging::log_request_summary;
use crate::mcp::rpc::{
    app_error_to_json_rpc, is_json_rpc_error, json_rpc_error, json_rpc_result,
    json_rpc_result_from, request_id_to_value, INTERNAL_ERROR, INVALID_PARAMS, INVALID_REQUEST,
    METHOD_NOT_FOUND,
};
use crate::AppState;

/// Handles one decoded JSON value. Returns `None` for notifications.
pub fn handle_json_rpc_value(state: &AppState, payload: Value) -> Option<Value> {
    if !payload.is_object() {
        return Some(json_rpc_error(None, INVALID_REQUEST, "Invalid Request"));
    }

    let request_id = payload.get("id").cloned();
    let parsed: JsonrpcMessage = match serde_json::from_value(payload) {
        Ok(message) => message,
        Err(_) => return Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request")),
    };

    match parsed {
        JsonrpcMessage::Request(request) => {
            if let Err(error_response) = validate_request_shape(&request) {
                return Some(error_response);
            }

            let request_id = request_id_to_value(request.id);
            if request.method.trim().is_empty() {
                return Some(json_rpc_error(
                    Some(request_id),
                    INVALID_REQUEST,
                    "Invalid Request",
                ));
            }

            Some(handle_json_rpc_request(
                state,
                Some(request_id),
                request.method,
                request.params.map(Value::Object),
            ))
        }
        // Notifications never reach the handlers: only requests may record a
        // handshake or run a tool.
        JsonrpcMessage::Notification(notification) => {
            debug!(method = %notification.method, "notification ignored");
            None
        }
        JsonrpcMessage::ResultResponse(_) | JsonrpcMessage::ErrorResponse(_) => {
            Some(json_rpc_error(request_id, INVALID_REQUEST, "Invalid Request"))
        }
    }
}

pub fn validate_request_shape(request: &JsonrpcRequest) -> Result<(), Value> {
    let request_id = Some(request_id_to_value(request.id.clone()));
    let Ok(payload) = serde_json::to_value(request) else {
        return Err(json_rpc_error(request_id, INTERNAL_ERROR, "Internal error"));
    };

    let valid = match request.method.as_str() {
        "tools/call" => serde_json::from_value::<CallToolRequest>(payload).is_ok(),
        "tools/list" => serde_json::from_value::<ListToolsRequest>(payload).is_ok(),
        "ping" => serde_json::from_value::<PingRequest>(payload).is_ok(),
        _ => true,
    };

    if valid {
        Ok(())
    } else {
        Err(json_rpc_error(request_id, INVALID_PARAMS, "Invalid params"))
    }
}

pub fn handle_json_rpc_request(
    state: &AppState,
    id: Option<Value>,
    method: String,
    params: Option<Value>,
) -> Value {
    let started_at = Instant::now();
    let tool = (method == "tools/call")
        .then(|| {
            params
                .as_ref()
                .and_then(|value| value.get("name"))
                .and_then(Value::as_str)
                .map(str::to_string)
        })
        .flatten();

    let response = match method.as_str() {
        "initialize" => match parse_initialize_params(params.as_ref()) {
            Ok(initialize_params) => {
                json_rpc_result_from(id, &on_initialize(&state.connection, initialize_params))
            }
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "ping" => json_rpc_result(id, json!({})),
        "tools/list" => match build_tools_list_result() {
            Ok(result) => json_rpc_result(id, result),
            Err(err) => app_error_to_json_rpc(id, err),
        },
        "tools/call" => handle_tools_call(state, id, params),
        _ => json_rpc_error(id, METHOD_NOT_FOUND, "Method not found"),
    };

    log_request_summary(
        &method,
        tool.as_deref(),
        is_json_rpc_error(&response),
        started_at,
    );

    response
}
