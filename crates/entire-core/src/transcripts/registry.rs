//! Static registry of transcript adapters.

use std::collections::HashMap;
use std::sync::LazyLock;

use super::claude::ClaudeAdapter;
use super::gemini::GeminiAdapter;
use super::traits::TranscriptAdapter;
use super::types::AgentType;

static REGISTRY: LazyLock<AdapterRegistry> = LazyLock::new(AdapterRegistry::new);

struct AdapterRegistry {
    adapters: HashMap<AgentType, Box<dyn TranscriptAdapter>>,
}

impl AdapterRegistry {
    fn new() -> Self {
        let mut adapters: HashMap<AgentType, Box<dyn TranscriptAdapter>> = HashMap::new();
        adapters.insert(AgentType::Claude, Box::new(ClaudeAdapter));
        adapters.insert(AgentType::Gemini, Box::new(GeminiAdapter));
        Self { adapters }
    }

    fn get(&self, agent_type: AgentType) -> Option<&dyn TranscriptAdapter> {
        self.adapters.get(&agent_type).map(|a| a.as_ref())
    }
}

/// Adapter for an agent type. Every `AgentType` variant is registered, so
/// a `None` here is a construction bug, not a runtime condition; callers
/// treat it as such.
pub fn adapter_for(agent_type: AgentType) -> Option<&'static dyn TranscriptAdapter> {
    REGISTRY.get(agent_type)
}

/// Adapter by agent name (case-insensitive).
pub fn adapter_by_name(name: &str) -> Option<&'static dyn TranscriptAdapter> {
    AgentType::parse(name).and_then(adapter_for)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_agent_type_has_an_adapter() {
        for agent in AgentType::all() {
            let adapter = adapter_for(*agent).expect("registered adapter");
            assert_eq!(adapter.agent_type(), *agent);
        }
    }

    #[test]
    fn test_adapter_by_name() {
        assert!(adapter_by_name("claude").is_some());
        assert!(adapter_by_name("GEMINI").is_some());
        assert!(adapter_by_name("kiro").is_none());
    }

    #[test]
    fn test_extensions_differ_by_format() {
        assert_eq!(adapter_for(AgentType::Claude).unwrap().transcript_extension(), "jsonl");
        assert_eq!(adapter_for(AgentType::Gemini).unwrap().transcript_extension(), "json");
    }
}
