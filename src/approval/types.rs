// ABOUTME: Core types for command governance.
// ABOUTME: RiskAssessment produced by analyzers and the ApprovalOutcome of the policy.

use serde::{Deserialize, Serialize};

/// The risk of a single command as judged by an analyzer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Severity of the command; 0 means nothing was flagged.
    pub risk_score: u32,
    /// Why the command was flagged. Present only when `risk_score > 0`.
    pub risk_reason: Option<String>,
}

impl RiskAssessment {
    /// An assessment that flags nothing.
    pub fn clear() -> Self {
        Self {
            risk_score: 0,
            risk_reason: None,
        }
    }

    /// An assessment that flags the command with the given score and reason.
    pub fn flagged(score: u32, reason: impl Into<String>) -> Self {
        Self {
            risk_score: score,
            risk_reason: Some(reason.into()),
        }
    }

    /// Whether the command needs human approval before it may run.
    pub fn is_risky(&self) -> bool {
        self.risk_score > 0
    }
}

/// The outcome of evaluating the approval policy for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    /// The command may run now.
    Execute,
    /// The command is withheld until a human approves it.
    AwaitApproval,
    /// The caller claimed approval but the token does not match the command.
    Reject,
}
