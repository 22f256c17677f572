//! Hook wire types: the JSON an agent pipes to a hook subprocess on
//! stdin, and the JSON the hook may answer with on stdout.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Lifecycle events dispatched to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookEvent {
    SessionStart,
    UserPromptSubmit,
    PreToolUse,
    PostToolUse,
    Stop,
}

impl HookEvent {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SessionStart" => Some(HookEvent::SessionStart),
            "UserPromptSubmit" => Some(HookEvent::UserPromptSubmit),
            "PreToolUse" => Some(HookEvent::PreToolUse),
            "PostToolUse" => Some(HookEvent::PostToolUse),
            "Stop" => Some(HookEvent::Stop),
            _ => None,
        }
    }
}

/// Incoming hook payload. Agents send more fields than these; everything
/// unknown is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct HookInput {
    pub session_id: String,

    #[serde(default)]
    pub transcript_path: Option<PathBuf>,

    #[serde(default)]
    pub cwd: Option<PathBuf>,

    pub hook_event_name: String,
}

/// Outgoing hook reply. Empty replies print nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HookOutput {
    #[serde(rename = "systemMessage", skip_serializing_if = "Option::is_none")]
    pub system_message: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision: Option<String>,
}

impl HookOutput {
    pub fn is_empty(&self) -> bool {
        self.system_message.is_none() && self.decision.is_none()
    }

    pub fn message(text: String) -> Self {
        Self {
            system_message: Some(text),
            decision: None,
        }
    }
}
