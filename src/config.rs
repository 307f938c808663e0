// ABOUTME: Configuration loading for termgate.
// ABOUTME: Reads ~/.termgate/config.toml (or an explicit path) with per-section defaults.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::approval::{DenylistAnalyzer, RiskRule};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub shell: ShellConfig,
    pub executor: ExecutorConfig,
    pub logging: LoggingConfig,
    pub risk: RiskConfig,
}

/// How commands are handed to the shell: `<program> <flag> <command>`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub program: String,
    pub flag: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        if cfg!(windows) {
            Self {
                program: "cmd".to_string(),
                flag: "/C".to_string(),
            }
        } else {
            Self {
                program: "/bin/sh".to_string(),
                flag: "-c".to_string(),
            }
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    /// Lines of output buffered per command before readers wait on the writer.
    pub output_buffer: usize,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self { output_buffer: 64 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

/// Extra denylist rules, consulted after the builtin table.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub rules: Vec<RuleConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RuleConfig {
    pub pattern: String,
    pub score: u32,
    pub reason: String,
}

impl Config {
    /// Load config from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields defaults; a missing explicit file is an error.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        match path {
            Some(path) => Self::load_from(path),
            None => {
                let path = Self::config_path();
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_from(&path)
            }
        }
    }

    /// Load and parse a specific config file.
    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        Ok(config)
    }

    /// Path to the default config file.
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".termgate")
            .join("config.toml")
    }

    /// Build the denylist analyzer: builtin rules followed by configured ones.
    pub fn analyzer(&self) -> anyhow::Result<DenylistAnalyzer> {
        let mut analyzer = DenylistAnalyzer::builtin();
        let extra = self
            .risk
            .rules
            .iter()
            .map(|r| RiskRule::new(&r.pattern, r.score, r.reason.clone()))
            .collect::<Result<Vec<_>, _>>()?;
        analyzer.extend(extra);
        Ok(analyzer)
    }
}
