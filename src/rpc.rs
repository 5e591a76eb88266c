// Line-delimited JSON-RPC 2.0 handling for the stdio server

use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{
    error::ApiError,
    orchestrator::HotelService,
    tools::{call_tool, tool_definitions},
};

pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;

/// Handles one raw input line. `Ok(None)` means nothing is written back (notifications);
/// `Err` is reserved for fatal conditions that must stop the process.
pub async fn handle_line(service: &HotelService, line: &str) -> Result<Option<Value>, ApiError> {
    match serde_json::from_str::<Value>(line) {
        Ok(message) => handle_message(service, message).await,
        Err(e) => Ok(Some(error_response(Value::Null, PARSE_ERROR, &e.to_string()))),
    }
}

pub async fn handle_message(
    service: &HotelService,
    message: Value,
) -> Result<Option<Value>, ApiError> {
    let id = message.get("id").cloned();
    let method = match message.get("method").and_then(Value::as_str) {
        Some(method) => method,
        None => {
            return Ok(Some(error_response(
                id.unwrap_or(Value::Null),
                INVALID_REQUEST,
                "missing method",
            )))
        }
    };

    // Notifications carry no id and get no answer.
    let Some(id) = id else {
        debug!(method, "Notification received");
        return Ok(None);
    };

    let result = match method {
        "initialize" => json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": { "tools": {} },
            "serverInfo": {
                "name": "hotel-booking-gateway",
                "version": env!("CARGO_PKG_VERSION"),
            },
        }),
        "ping" => json!({}),
        "tools/list" => json!({ "tools": tool_definitions() }),
        "tools/call" => {
            let params = message.get("params").cloned().unwrap_or(Value::Null);
            let name = params.get("name").and_then(Value::as_str).unwrap_or_default();
            let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

            match call_tool(service, name, arguments).await {
                Ok(output) => json!({
                    "content": [{ "type": "text", "text": output.text }],
                    "structuredContent": output.structured,
                    "isError": false,
                }),
                Err(e) if e.is_fatal() => return Err(e),
                Err(e) => {
                    warn!(tool = name, error = %e, "Tool call failed");
                    json!({
                        "content": [{ "type": "text", "text": format!("❌ {e}") }],
                        "isError": true,
                    })
                }
            }
        }
        other => {
            return Ok(Some(error_response(
                id,
                METHOD_NOT_FOUND,
                &format!("method not found: {other}"),
            )))
        }
    };

    Ok(Some(json!({ "jsonrpc": "2.0", "id": id, "result": result })))
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message },
    })
}
