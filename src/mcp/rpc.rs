//! JSON-RPC envelope helpers
//!
//! Maps `AppError` onto JSON-RPC error objects and wraps results with the SDK response types.

use rust_mcp_sdk::schema::{
    JsonrpcErrorResponse, JsonrpcResultResponse, RequestId, Result as McpResult, RpcError,
};
use serde::Serialize;
use serde_json::{json, Value};

use crate::errors::AppError;

pub const PARSE_ERROR: i32 = -32700;
pub const INVALID_REQUEST: i32 = -32600;
pub const METHOD_NOT_FOUND: i32 = -32601;
pub const INVALID_PARAMS: i32 = -32602;
pub const INTERNAL_ERROR: i32 = -32603;

pub fn is_json_rpc_error(value: &Value) -> bool {
    value.get("error").is_some()
}

pub fn app_error_to_json_rpc(id: Option<Value>, err: AppError) -> Value {
    match err {
        AppError::BadRequest { code, message } => json_rpc_error_with_data(
            id,
            INVALID_PARAMS,
            "Invalid params",
            Some(json!({
                "code": code,
                "message": message,
                "details": {}
            })),
        ),
        AppError::UnknownTool { name } => json_rpc_error_with_data(
            id,
            METHOD_NOT_FOUND,
            "Method not found",
            Some(json!({
                "code": "tool_not_found",
                "message": "unknown tool name",
                "details": {
                    "name": name,
                },
            })),
        ),
        AppError::Internal { code, message } => {
            tracing::error!(code, error = %message, "request failed with internal error");
            json_rpc_error(id, INTERNAL_ERROR, "Internal error")
        }
    }
}

pub fn json_rpc_error(id: Option<Value>, code: i32, message: &str) -> Value {
    json_rpc_error_with_data(id, code, message, None)
}

pub fn json_rpc_error_with_data(
    id: Option<Value>,
    code: i32,
    message: &str,
    data: Option<Value>,
) -> Value {
    let response = JsonrpcErrorResponse::new(
        RpcError {
            code: i64::from(code),
            data: data.clone(),
            message: message.to_string(),
        },
        id.as_ref().and_then(value_to_request_id),
    );

    serde_json::to_value(response).unwrap_or_else(|_| {
        json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": {
                "code": code,
                "message": message,
                "data": data,
            }
        })
    })
}

pub fn json_rpc_result(id: Option<Value>, result: Value) -> Value {
    if let Some(request_id) = id.as_ref().and_then(value_to_request_id) {
        let extra = result.as_object().cloned();
        let response = JsonrpcResultResponse::new(request_id, McpResult { meta: None, extra });
        if let Ok(value) = serde_json::to_value(response) {
            return value;
        }
    }

    json!({
        "jsonrpc": "2.0",
        "id": id,
        "result": result
    })
}

/// Serializes an SDK result type and wraps it in a result envelope.
pub fn json_rpc_result_from<T: Serialize>(id: Option<Value>, result: &T) -> Value {
    match serde_json::to_value(result) {
        Ok(value) => json_rpc_result(id, value),
        Err(err) => app_error_to_json_rpc(
            id,
            AppError::internal(format!("result serialization failed: {err}")),
        ),
    }
}

pub fn value_to_request_id(value: &Value) -> Option<RequestId> {
    if let Some(string_id) = value.as_str() {
        return Some(RequestId::String(string_id.to_string()));
    }

    value.as_i64().map(RequestId::Integer)
}

pub fn request_id_to_value(id: RequestId) -> Value {
    match id {
        RequestId::String(value) => Value::String(value),
        RequestId::Integer(value) => Value::Number(value.into()),
    }
}
