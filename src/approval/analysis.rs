// ABOUTME: Shell command risk analysis — an ordered denylist of regex rules over the raw command text.
// ABOUTME: Heuristic only; quoting, variable expansion, or encoding can hide a command from it.

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use super::types::RiskAssessment;

/// Something that can judge how dangerous a shell command is.
///
/// The gateway only sees this trait, so a stronger analyzer (a real shell
/// parser, an external policy service) can replace the denylist without
/// touching dispatch.
pub trait RiskAnalyzer: Send + Sync {
    /// Assess a command. Must be pure: the same text always yields the same result.
    fn assess(&self, command: &str) -> RiskAssessment;
}

/// The canonical denylist: (pattern, score, reason).
pub const BUILTIN_RULES: &[(&str, u32, &str)] = &[
    (r"\brm\b", 9, "destructive file removal"),
    (r"\bsudo\b", 10, "privilege escalation"),
    (r"\bchmod\b", 7, "permission change"),
    (r"\bchown\b", 7, "ownership change"),
    (r"\bmkfs\b", 10, "filesystem format"),
    (r"\bdd\b", 9, "low-level disk write"),
    (r"curl\b.*\|\s*(ba)?sh\b", 10, "remote code execution via pipe"),
    (r"wget\b.*\|\s*(ba)?sh\b", 10, "remote code execution via pipe"),
    (r"\bmv\b.*\s/[a-zA-Z]", 6, "move to system path"),
    (r"\bkill\b", 6, "process termination"),
    (r"\bshutdown\b", 10, "system shutdown"),
    (r"\breboot\b", 10, "system reboot"),
    (r"\bpkill\b", 6, "process kill"),
    (r"\biptables\b", 8, "firewall modification"),
    (r"\bcrontab\b", 7, "scheduled task modification"),
];

static BUILTIN: LazyLock<Vec<RiskRule>> = LazyLock::new(|| {
    BUILTIN_RULES
        .iter()
        .map(|(pattern, score, reason)| {
            RiskRule::new(pattern, *score, *reason).expect("builtin risk pattern must compile")
        })
        .collect()
});

/// Errors raised while building a rule from configuration.
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("invalid risk pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("risk rule {pattern:?} must have a score above zero")]
    ZeroScore { pattern: String },
}

/// One denylist entry.
#[derive(Debug, Clone)]
pub struct RiskRule {
    pattern: Regex,
    score: u32,
    reason: String,
}

impl RiskRule {
    /// Compile a rule. A zero score would flag nothing, so it is rejected.
    pub fn new(pattern: &str, score: u32, reason: impl Into<String>) -> Result<Self, RuleError> {
        if score == 0 {
            return Err(RuleError::ZeroScore {
                pattern: pattern.to_string(),
            });
        }
        let compiled = Regex::new(pattern).map_err(|source| RuleError::InvalidPattern {
            pattern: pattern.to_string(),
            source,
        })?;
        Ok(Self {
            pattern: compiled,
            score,
            reason: reason.into(),
        })
    }
}

/// Regex denylist analyzer.
///
/// When several rules match, the one whose match starts leftmost in the
/// command text wins; rules matching at the same offset are ranked by their
/// position in the table.
#[derive(Debug, Clone)]
pub struct DenylistAnalyzer {
    rules: Vec<RiskRule>,
}

impl DenylistAnalyzer {
    /// Analyzer loaded with the canonical rule table.
    pub fn builtin() -> Self {
        Self {
            rules: BUILTIN.clone(),
        }
    }

    /// Analyzer with exactly the given rules, in order.
    pub fn with_rules(rules: Vec<RiskRule>) -> Self {
        Self { rules }
    }

    /// Append rules after the existing ones.
    pub fn extend(&mut self, rules: impl IntoIterator<Item = RiskRule>) {
        self.rules.extend(rules);
    }

    pub fn rules(&self) -> &[RiskRule] {
        &self.rules
    }
}

impl Default for DenylistAnalyzer {
    fn default() -> Self {
        Self::builtin()
    }
}

impl RiskAnalyzer for DenylistAnalyzer {
    fn assess(&self, command: &str) -> RiskAssessment {
        let mut best: Option<(usize, &RiskRule)> = None;
        for rule in &self.rules {
            let Some(m) = rule.pattern.find(command) else {
                continue;
            };
            // Strictly-less keeps the earlier rule on ties.
            if best.is_none_or(|(start, _)| m.start() < start) {
                best = Some((m.start(), rule));
            }
        }

        match best {
            Some((_, rule)) => RiskAssessment::flagged(rule.score, rule.reason.clone()),
            None => RiskAssessment::clear(),
        }
    }
}
