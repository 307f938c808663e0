// ABOUTME: Approval policy decision logic for terminal commands.
// ABOUTME: Combines risk, the caller's approval claim, and token validity into an ApprovalOutcome.

use super::types::ApprovalOutcome;

/// Evaluate the approval policy for one command.
///
/// `token_valid` is only consulted when the command is risky and the caller
/// claims approval.
pub fn evaluate_approval(risky: bool, approved: bool, token_valid: bool) -> ApprovalOutcome {
    // Rule 1: nothing flagged, nothing to approve.
    if !risky {
        return ApprovalOutcome::Execute;
    }

    // Rule 2: risky and unapproved always stops at the gate.
    if !approved {
        return ApprovalOutcome::AwaitApproval;
    }

    // Rule 3: approval only counts with a token bound to this command.
    if token_valid {
        ApprovalOutcome::Execute
    } else {
        ApprovalOutcome::Reject
    }
}
