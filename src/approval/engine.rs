// ABOUTME: Governance engine — orchestrates risk analysis, approval policy, and token signing.
// ABOUTME: Decides whether a terminal command runs now, waits for approval, or is rejected.

use serde::{Deserialize, Serialize};

use super::{
    analysis::RiskAnalyzer,
    policy::evaluate_approval,
    token::ApprovalSigner,
    types::ApprovalOutcome,
};

/// The `arguments` object of a `terminal.run` call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolCallArguments {
    #[serde(default)]
    pub command: String,
    #[serde(default)]
    pub approved: bool,
    #[serde(default, rename = "approvalToken")]
    pub approval_token: String,
}

/// Result body sent back when a command is withheld pending approval.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernanceGate {
    pub is_governance_required: bool,
    pub command: String,
    pub risk_score: u32,
    pub risk_reason: String,
    #[serde(rename = "approvalToken")]
    pub approval_token: String,
}

/// The engine's decision for one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Run the command.
    Execute { command: String },
    /// Do not run; hand the caller the assessment and a token to approve with.
    AwaitingApproval(GovernanceGate),
    /// Approval was claimed with a token that does not match the command.
    TokenRejected { command: String },
}

/// Ties together a risk analyzer and the process-wide approval signer.
pub struct GovernanceEngine {
    analyzer: Box<dyn RiskAnalyzer>,
    signer: ApprovalSigner,
}

impl GovernanceEngine {
    /// Create an engine from an analyzer and a signer.
    pub fn new(analyzer: Box<dyn RiskAnalyzer>, signer: ApprovalSigner) -> Self {
        Self { analyzer, signer }
    }

    /// Evaluate a call whose `command` is already trimmed and non-empty.
    pub fn check(&self, command: &str, approved: bool, approval_token: &str) -> EngineOutcome {
        let assessment = self.analyzer.assess(command);
        let risky = assessment.is_risky();
        let token_valid = risky && approved && self.signer.verify(command, approval_token);

        match evaluate_approval(risky, approved, token_valid) {
            ApprovalOutcome::Execute => EngineOutcome::Execute {
                command: command.to_string(),
            },
            ApprovalOutcome::AwaitApproval => EngineOutcome::AwaitingApproval(GovernanceGate {
                is_governance_required: true,
                command: command.to_string(),
                risk_score: assessment.risk_score,
                risk_reason: assessment.risk_reason.unwrap_or_default(),
                approval_token: self.signer.issue(command),
            }),
            ApprovalOutcome::Reject => EngineOutcome::TokenRejected {
                command: command.to_string(),
            },
        }
    }
}
