//! Agent type definitions.

use serde::{Deserialize, Serialize};

/// Supported agent families.
///
/// Each variant has a transcript adapter that understands the agent's
/// native transcript format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentType {
    Claude,
    Gemini,
}

impl AgentType {
    /// Get the canonical string name for this agent type.
    pub fn as_str(&self) -> &'static str {
        match self {
            AgentType::Claude => "claude",
            AgentType::Gemini => "gemini",
        }
    }

    /// Parse an agent type from a string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "claude" => Some(AgentType::Claude),
            "gemini" => Some(AgentType::Gemini),
            _ => None,
        }
    }

    /// Get all supported agent types.
    pub fn all() -> &'static [AgentType] {
        &[AgentType::Claude, AgentType::Gemini]
    }
}

impl std::fmt::Display for AgentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for AgentType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| {
            let supported = AgentType::all()
                .iter()
                .map(|a| a.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("Unknown agent '{}'. Supported: {}", s, supported)
        })
    }
}
