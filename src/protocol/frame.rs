// ABOUTME: JSON-RPC 2.0 frame types — requests in, responses and output notifications out.
// ABOUTME: Every frame serializes to exactly one line of JSON.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const JSONRPC_VERSION: &str = "2.0";

/// The only method the gateway serves.
pub const TOOLS_CALL_METHOD: &str = "tools/call";
/// The only tool the gateway exposes.
pub const TERMINAL_RUN_TOOL: &str = "terminal.run";
/// Method name of streamed output notifications.
pub const TERMINAL_OUTPUT_METHOD: &str = "notifications/terminal/output";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

/// An inbound request. `jsonrpc` is accepted but not enforced.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

impl Request {
    /// Parse one input line. Only a JSON object is a request; arrays and
    /// scalars are rejected before field decoding sees them.
    pub fn parse(line: &str) -> Result<Self, String> {
        match serde_json::from_str::<Value>(line).map_err(|e| e.to_string())? {
            value @ Value::Object(_) => serde_json::from_value(value).map_err(|e| e.to_string()),
            _ => Err("request must be a JSON object".to_string()),
        }
    }

    /// The id to echo back; absent ids are answered with `null`.
    pub fn reply_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }

    /// `params.name`, or empty when absent.
    pub fn tool_name(&self) -> &str {
        self.params
            .get("name")
            .and_then(Value::as_str)
            .unwrap_or("")
    }

    /// `params.arguments`, or an empty object when absent.
    pub fn tool_arguments(&self) -> Value {
        self.params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| Value::Object(Default::default()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i64,
    pub message: String,
}

/// A response frame carrying either `result` or `error`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl Response {
    pub fn result(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(RpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Params of a terminal output notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputChunk {
    pub id: Value,
    pub chunk: String,
}

/// A notification frame. It has no id of its own; the request id rides in params.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub jsonrpc: String,
    pub method: String,
    pub params: OutputChunk,
}

impl Notification {
    /// One line of a running command's output.
    pub fn terminal_output(id: Value, chunk: impl Into<String>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            method: TERMINAL_OUTPUT_METHOD.to_string(),
            params: OutputChunk {
                id,
                chunk: chunk.into(),
            },
        }
    }
}

/// Result body of the terminal frame of an executed command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionResult {
    #[serde(rename = "exitCode")]
    pub exit_code: i32,
    pub done: bool,
}

impl ExecutionResult {
    pub fn completed(exit_code: i32) -> Self {
        Self {
            exit_code,
            done: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_parses_full_call() {
        let req: Request = serde_json::from_str(
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"terminal.run","arguments":{"command":"echo hi"}}}"#,
        )
        .unwrap();
        assert_eq!(req.reply_id(), json!(1));
        assert_eq!(req.method, TOOLS_CALL_METHOD);
        assert_eq!(req.tool_name(), TERMINAL_RUN_TOOL);
        assert_eq!(req.tool_arguments(), json!({ "command": "echo hi" }));
    }

    #[test]
    fn request_defaults_missing_fields() {
        let req: Request = serde_json::from_str("{}").unwrap();
        assert_eq!(req.reply_id(), Value::Null);
        assert_eq!(req.method, "");
        assert_eq!(req.tool_name(), "");
        assert_eq!(req.tool_arguments(), json!({}));
    }

    #[test]
    fn request_keeps_string_ids() {
        let req: Request = serde_json::from_str(r#"{"id":"abc","method":"x"}"#).unwrap();
        assert_eq!(req.reply_id(), json!("abc"));
    }

    #[test]
    fn non_object_lines_are_not_requests() {
        assert!(Request::parse("5").is_err());
        assert!(Request::parse("[1]").is_err());
        assert!(Request::parse("null").is_err());
        assert!(Request::parse(r#"{"method":5}"#).is_err());
        assert!(Request::parse("{").is_err());
    }

    #[test]
    fn positional_array_call_is_not_a_request() {
        let line = r#"[7,"tools/call",{"name":"terminal.run","arguments":{"command":"echo pwned"}}]"#;
        assert_eq!(
            Request::parse(line),
            Err("request must be a JSON object".to_string())
        );
    }

    #[test]
    fn parse_accepts_object_requests() {
        let req = Request::parse(r#"{"id":4,"method":"tools/call"}"#).unwrap();
        assert_eq!(req.reply_id(), json!(4));
        assert_eq!(req.method, TOOLS_CALL_METHOD);
    }

    #[test]
    fn result_response_omits_error() {
        let resp = Response::result(json!(3), json!({ "exitCode": 0, "done": true }));
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({ "jsonrpc": "2.0", "id": 3, "result": { "exitCode": 0, "done": true } }),
        );
    }

    #[test]
    fn error_response_keeps_null_id() {
        let resp = Response::error(Value::Null, PARSE_ERROR, "Parse error: eof");
        assert_eq!(
            serde_json::to_value(&resp).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "id": null,
                "error": { "code": -32700, "message": "Parse error: eof" }
            }),
        );
    }

    #[test]
    fn output_notification_shape() {
        let n = Notification::terminal_output(json!(1), "hi\n");
        assert_eq!(
            serde_json::to_value(&n).unwrap(),
            json!({
                "jsonrpc": "2.0",
                "method": "notifications/terminal/output",
                "params": { "id": 1, "chunk": "hi\n" }
            }),
        );
    }

    #[test]
    fn execution_result_shape() {
        assert_eq!(
            serde_json::to_value(ExecutionResult::completed(2)).unwrap(),
            json!({ "exitCode": 2, "done": true }),
        );
    }
}
