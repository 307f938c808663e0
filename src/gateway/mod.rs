// ABOUTME: Request dispatcher — routes each frame through governance and runs approved commands.
// ABOUTME: Replies are written inline; each executing command runs as its own tokio task.

pub mod error;

pub use error::GatewayError;

use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncRead, AsyncWrite, BufReader};
use tokio::task::JoinSet;

use crate::approval::{ApprovalSigner, EngineOutcome, GovernanceEngine, ToolCallArguments};
use crate::config::Config;
use crate::executor::CommandExecutor;
use crate::protocol::{
    ExecutionResult, FrameReader, FrameWriter, Inbound, Notification, Request, Response,
    TERMINAL_RUN_TOOL, TOOLS_CALL_METHOD,
};

/// Where a request goes after the synchronous checks.
#[derive(Debug, Clone, PartialEq)]
pub enum Routed {
    /// Terminal reply that needs no execution.
    Reply(Response),
    /// Cleared for execution.
    Execute { id: Value, command: String },
}

/// The governance gateway: a governance engine in front of a command executor.
pub struct Gateway {
    engine: GovernanceEngine,
    executor: Arc<CommandExecutor>,
}

impl Gateway {
    pub fn new(engine: GovernanceEngine, executor: CommandExecutor) -> Self {
        Self {
            engine,
            executor: Arc::new(executor),
        }
    }

    /// Build a gateway from configuration with a freshly generated signing secret.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let analyzer = config.analyzer()?;
        let engine = GovernanceEngine::new(Box::new(analyzer), ApprovalSigner::generate());
        let executor = CommandExecutor::new(config.shell.clone(), &config.executor);
        Ok(Self::new(engine, executor))
    }

    pub fn engine(&self) -> &GovernanceEngine {
        &self.engine
    }

    /// Run the synchronous part of a request's lifecycle.
    pub fn route(&self, request: &Request) -> Routed {
        let id = request.reply_id();
        match self.resolve(request, &id) {
            Ok(routed) => routed,
            Err(e) => {
                tracing::debug!(id = %id, error = %e, "request refused");
                Routed::Reply(e.to_response(id))
            }
        }
    }

    fn resolve(&self, request: &Request, id: &Value) -> Result<Routed, GatewayError> {
        if request.method != TOOLS_CALL_METHOD {
            return Err(GatewayError::MethodNotFound(request.method.clone()));
        }

        let tool = request.tool_name();
        if tool != TERMINAL_RUN_TOOL {
            return Err(GatewayError::ToolNotFound(tool.to_string()));
        }

        let args: ToolCallArguments = serde_json::from_value(request.tool_arguments())
            .map_err(|e| GatewayError::InvalidArguments(e.to_string()))?;
        let command = args.command.trim();
        if command.is_empty() {
            return Err(GatewayError::MissingCommand);
        }

        match self.engine.check(command, args.approved, &args.approval_token) {
            EngineOutcome::Execute { command } => Ok(Routed::Execute {
                id: id.clone(),
                command,
            }),
            EngineOutcome::AwaitingApproval(gate) => {
                tracing::warn!(
                    id = %id,
                    command = %gate.command,
                    risk_score = gate.risk_score,
                    risk_reason = %gate.risk_reason,
                    "approval required"
                );
                Ok(Routed::Reply(Response::result(
                    id.clone(),
                    serde_json::to_value(&gate)?,
                )))
            }
            EngineOutcome::TokenRejected { command } => {
                tracing::warn!(id = %id, command = %command, "approval token rejected");
                Err(GatewayError::TokenRejected)
            }
        }
    }

    /// Serve frames from `input` until end of stream, writing to `output`.
    ///
    /// Commands still running at end of stream are waited for, so every
    /// request gets its terminal frame before this returns.
    pub async fn serve<R, W>(&self, input: R, output: W) -> anyhow::Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Send + Unpin + 'static,
    {
        let writer = FrameWriter::new(output);
        let mut reader = FrameReader::new(BufReader::new(input));
        let mut in_flight = JoinSet::new();

        let result = loop {
            let inbound = match reader.next_frame().await {
                Ok(Some(inbound)) => inbound,
                Ok(None) => break Ok(()),
                Err(e) => break Err(anyhow::Error::from(e).context("reading request stream")),
            };

            while let Some(joined) = in_flight.try_join_next() {
                log_join(joined);
            }

            match inbound {
                Inbound::Malformed(detail) => {
                    tracing::debug!(%detail, "malformed frame");
                    emit(&writer, &GatewayError::Parse(detail).to_response(Value::Null)).await;
                }
                Inbound::Request(request) => match self.route(&request) {
                    Routed::Reply(response) => emit(&writer, &response).await,
                    Routed::Execute { id, command } => {
                        tracing::info!(id = %id, command = %command, "executing command");
                        in_flight.spawn(run_command(
                            self.executor.clone(),
                            writer.clone(),
                            id,
                            command,
                        ));
                    }
                },
            }
        };

        while let Some(joined) = in_flight.join_next().await {
            log_join(joined);
        }
        if let Err(e) = writer.shutdown().await {
            tracing::debug!(error = %e, "closing output stream failed");
        }
        result
    }
}

/// The executing half of a request: stream output, then exactly one terminal frame.
async fn run_command(
    executor: Arc<CommandExecutor>,
    writer: FrameWriter,
    id: Value,
    command: String,
) {
    let response = match stream_command(&executor, &writer, &id, &command).await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!(id = %id, command = %command, error = %e, "command failed");
            e.to_response(id)
        }
    };
    emit(&writer, &response).await;
}

async fn stream_command(
    executor: &CommandExecutor,
    writer: &FrameWriter,
    id: &Value,
    command: &str,
) -> Result<Response, GatewayError> {
    let mut running = executor.spawn(command)?;
    while let Some(chunk) = running.next_chunk().await {
        emit(writer, &Notification::terminal_output(id.clone(), chunk)).await;
    }
    let exit_code = running.wait().await?;
    tracing::info!(id = %id, exit_code, "command finished");
    Ok(Response::result(
        id.clone(),
        serde_json::to_value(ExecutionResult::completed(exit_code))?,
    ))
}

async fn emit<T: Serialize>(writer: &FrameWriter, frame: &T) {
    if let Err(e) = writer.emit(frame).await {
        tracing::warn!(error = %e, "failed to write frame");
    }
}

fn log_join(joined: Result<(), tokio::task::JoinError>) {
    if let Err(e) = joined {
        tracing::error!(error = %e, "command task panicked");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approval::{DenylistAnalyzer, SECRET_LEN};
    use crate::config::{ExecutorConfig, ShellConfig};
    use crate::protocol::{INTERNAL_ERROR, INVALID_PARAMS, METHOD_NOT_FOUND};
    use serde_json::json;

    fn gateway() -> Gateway {
        let engine = GovernanceEngine::new(
            Box::new(DenylistAnalyzer::builtin()),
            ApprovalSigner::from_secret([1u8; SECRET_LEN]),
        );
        Gateway::new(
            engine,
            CommandExecutor::new(ShellConfig::default(), &ExecutorConfig::default()),
        )
    }

    fn call(id: Value, arguments: Value) -> Request {
        serde_json::from_value(json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "tools/call",
            "params": { "name": "terminal.run", "arguments": arguments }
        }))
        .unwrap()
    }

    fn error_code(routed: &Routed) -> i64 {
        match routed {
            Routed::Reply(Response {
                error: Some(err), ..
            }) => err.code,
            other => panic!("expected error reply, got {:?}", other),
        }
    }

    #[test]
    fn unknown_method_is_not_found() {
        let req: Request =
            serde_json::from_value(json!({ "id": 1, "method": "tools/list" })).unwrap();
        assert_eq!(error_code(&gateway().route(&req)), METHOD_NOT_FOUND);
    }

    #[test]
    fn unknown_tool_is_not_found() {
        let req: Request = serde_json::from_value(json!({
            "id": 1,
            "method": "tools/call",
            "params": { "name": "shell.exec", "arguments": { "command": "ls" } }
        }))
        .unwrap();
        let routed = gateway().route(&req);
        assert_eq!(error_code(&routed), METHOD_NOT_FOUND);
    }

    #[test]
    fn missing_or_blank_command_is_invalid_params() {
        let gw = gateway();
        assert_eq!(error_code(&gw.route(&call(json!(1), json!({})))), INVALID_PARAMS);
        assert_eq!(
            error_code(&gw.route(&call(json!(1), json!({ "command": "   " })))),
            INVALID_PARAMS
        );
    }

    #[test]
    fn malformed_arguments_are_invalid_params() {
        let gw = gateway();
        assert_eq!(
            error_code(&gw.route(&call(json!(1), json!({ "command": 5 })))),
            INVALID_PARAMS
        );
        assert_eq!(
            error_code(&gw.route(&call(json!(1), json!("echo hi")))),
            INVALID_PARAMS
        );
    }

    #[test]
    fn safe_command_is_cleared_for_execution() {
        assert_eq!(
            gateway().route(&call(json!(7), json!({ "command": "  echo hi  " }))),
            Routed::Execute {
                id: json!(7),
                command: "echo hi".to_string()
            }
        );
    }

    #[test]
    fn risky_command_gets_governance_gate() {
        let routed = gateway().route(&call(json!("a"), json!({ "command": "sudo rm -rf /tmp/x" })));
        let result = match routed {
            Routed::Reply(Response {
                id,
                result: Some(result),
                error: None,
                ..
            }) => {
                assert_eq!(id, json!("a"));
                result
            }
            other => panic!("expected governance result, got {:?}", other),
        };
        assert_eq!(result["is_governance_required"], true);
        assert_eq!(result["command"], "sudo rm -rf /tmp/x");
        assert_eq!(result["risk_score"], 10);
        assert_eq!(result["risk_reason"], "privilege escalation");
        assert!(result["approvalToken"].as_str().is_some());
    }

    #[test]
    fn approved_with_matching_token_executes() {
        let gw = gateway();
        let token = gw.engine().check("rm -rf /tmp/x", false, "");
        let token = match token {
            EngineOutcome::AwaitingApproval(gate) => gate.approval_token,
            other => panic!("expected gate, got {:?}", other),
        };
        let routed = gw.route(&call(
            json!(2),
            json!({ "command": "rm -rf /tmp/x", "approved": true, "approvalToken": token }),
        ));
        assert!(matches!(routed, Routed::Execute { .. }));
    }

    #[test]
    fn approved_with_foreign_token_is_rejected() {
        let gw = gateway();
        let token = match gw.engine().check("rm -rf /tmp/x", false, "") {
            EngineOutcome::AwaitingApproval(gate) => gate.approval_token,
            other => panic!("expected gate, got {:?}", other),
        };
        let routed = gw.route(&call(
            json!(3),
            json!({ "command": "rm -rf /", "approved": true, "approvalToken": token }),
        ));
        assert_eq!(error_code(&routed), INTERNAL_ERROR);
    }

    #[test]
    fn approved_without_token_is_rejected() {
        let routed = gateway().route(&call(json!(4), json!({ "command": "reboot", "approved": true })));
        assert_eq!(error_code(&routed), INTERNAL_ERROR);
    }

    #[test]
    fn absent_id_is_answered_with_null() {
        let req: Request = serde_json::from_value(json!({ "method": "nope" })).unwrap();
        match gateway().route(&req) {
            Routed::Reply(resp) => assert_eq!(resp.id, Value::Null),
            other => panic!("expected reply, got {:?}", other),
        }
    }
}
