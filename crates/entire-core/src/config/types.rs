use serde::{Deserialize, Serialize};

/// Checkpointing strategy. Only manual-commit condensation is implemented;
/// the enum keeps the trailer value and config key in one place.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Strategy {
    #[default]
    #[serde(rename = "manual-commit")]
    ManualCommit,
}

impl Strategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Strategy::ManualCommit => "manual-commit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manual-commit" => Some(Strategy::ManualCommit),
            _ => None,
        }
    }
}

impl std::fmt::Display for Strategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Process-wide configuration, loaded once at hook/CLI start and passed by
/// value into every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntireConfig {
    /// Checkpointing strategy.
    #[serde(default)]
    pub strategy: Strategy,

    /// Default agent family for hook installation and resume commands.
    #[serde(default = "default_agent")]
    pub agent: String,

    /// Suppress telemetry emission entirely.
    #[serde(default)]
    pub telemetry_optout: bool,

    /// Screen-reader friendly CLI output (no glyphs, no color).
    #[serde(default)]
    pub accessible: bool,
}

fn default_agent() -> String {
    "claude".to_string()
}

impl Default for EntireConfig {
    fn default() -> Self {
        Self {
            strategy: Strategy::default(),
            agent: default_agent(),
            telemetry_optout: false,
            accessible: false,
        }
    }
}
