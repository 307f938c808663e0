// ABOUTME: Gateway error taxonomy and its mapping onto JSON-RPC error codes.
// ABOUTME: Every per-request failure becomes exactly one error response; none stop the gateway.

use serde_json::Value;
use thiserror::Error;

use crate::executor::ExecError;
use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND, PARSE_ERROR, Response};

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Method not found: {0}")]
    MethodNotFound(String),
    #[error("Unknown tool: {0}")]
    ToolNotFound(String),
    #[error("Missing required argument: command")]
    MissingCommand,
    #[error("Invalid arguments: {0}")]
    InvalidArguments(String),
    #[error("Invalid or missing approvalToken")]
    TokenRejected,
    #[error(transparent)]
    Exec(#[from] ExecError),
    #[error("Failed to encode result: {0}")]
    Encode(#[from] serde_json::Error),
}

impl GatewayError {
    /// JSON-RPC error code for this failure.
    pub fn code(&self) -> i64 {
        match self {
            GatewayError::Parse(_) => PARSE_ERROR,
            GatewayError::MethodNotFound(_) | GatewayError::ToolNotFound(_) => METHOD_NOT_FOUND,
            GatewayError::MissingCommand | GatewayError::InvalidArguments(_) => INVALID_PARAMS,
            GatewayError::TokenRejected | GatewayError::Exec(_) | GatewayError::Encode(_) => {
                INTERNAL_ERROR
            }
        }
    }

    /// Error response frame for the request with `id`.
    pub fn to_response(&self, id: Value) -> Response {
        Response::error(id, self.code(), self.to_string())
    }
}
