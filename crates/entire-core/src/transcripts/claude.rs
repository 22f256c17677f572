//! Transcript adapter for Claude Code.
//!
//! Claude Code transcripts are JSONL: one JSON object per line with a
//! `type` ("user" / "assistant" / ...), a `uuid`, and a `message` whose
//! `content` is either a plain string or an array of blocks (`text`,
//! `tool_use`, `tool_result`).

use std::collections::BTreeSet;

use tracing::warn;

use super::errors::TranscriptError;
use super::traits::{TranscriptAdapter, TranscriptEntry};
use super::types::AgentType;

/// Tool names whose invocations modify files in the worktree.
const FILE_WRITING_TOOLS: &[&str] = &["Write", "Edit", "MultiEdit", "NotebookEdit"];

pub struct ClaudeAdapter;

impl ClaudeAdapter {
    fn content_blocks(entry: &TranscriptEntry) -> Option<&Vec<serde_json::Value>> {
        entry.get("message")?.get("content")?.as_array()
    }

    /// Plain prompt text of a user entry; `None` for tool-result carriers
    /// and non-user entries.
    fn user_prompt_text(entry: &TranscriptEntry) -> Option<String> {
        if entry.get("type")?.as_str()? != "user" {
            return None;
        }
        let content = entry.get("message")?.get("content")?;
        if let Some(text) = content.as_str() {
            return Some(text.to_string());
        }
        let blocks = content.as_array()?;
        if blocks
            .iter()
            .any(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_result"))
        {
            return None;
        }
        let text: Vec<&str> = blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect();
        if text.is_empty() {
            None
        } else {
            Some(text.join("\n"))
        }
    }
}

impl TranscriptAdapter for ClaudeAdapter {
    fn agent_type(&self) -> AgentType {
        AgentType::Claude
    }

    fn transcript_extension(&self) -> &'static str {
        "jsonl"
    }

    /// Parse JSONL, skipping unparseable lines: the transcript is a live
    /// file and its final line may be mid-write when a hook fires.
    fn parse(&self, bytes: &[u8]) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        let text = String::from_utf8_lossy(bytes);
        let mut entries = Vec::new();
        for (index, line) in text.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(line) {
                Ok(value) => entries.push(value),
                Err(e) => {
                    warn!(
                        event = "core.transcript.claude_line_skipped",
                        line = index + 1,
                        error = %e,
                    );
                }
            }
        }
        Ok(entries)
    }

    fn derive_modified_files(&self, entries: &[TranscriptEntry]) -> BTreeSet<String> {
        let mut files = BTreeSet::new();
        for entry in entries {
            let Some(blocks) = Self::content_blocks(entry) else {
                continue;
            };
            for block in blocks {
                if block.get("type").and_then(|t| t.as_str()) != Some("tool_use") {
                    continue;
                }
                let name = block.get("name").and_then(|n| n.as_str()).unwrap_or("");
                if !FILE_WRITING_TOOLS.contains(&name) {
                    continue;
                }
                if let Some(path) = block
                    .get("input")
                    .and_then(|i| i.get("file_path"))
                    .and_then(|p| p.as_str())
                {
                    files.insert(path.to_string());
                }
            }
        }
        files
    }

    fn first_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String> {
        entries.iter().find_map(Self::user_prompt_text)
    }

    fn last_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String> {
        entries.iter().rev().find_map(Self::user_prompt_text)
    }

    fn find_checkpoint_uuid(
        &self,
        entries: &[TranscriptEntry],
        tool_use_id: &str,
    ) -> Option<String> {
        for entry in entries {
            let Some(blocks) = Self::content_blocks(entry) else {
                continue;
            };
            let matches = blocks.iter().any(|b| {
                let block_type = b.get("type").and_then(|t| t.as_str());
                match block_type {
                    Some("tool_use") => b.get("id").and_then(|i| i.as_str()) == Some(tool_use_id),
                    Some("tool_result") => {
                        b.get("tool_use_id").and_then(|i| i.as_str()) == Some(tool_use_id)
                    }
                    _ => false,
                }
            });
            if matches
                && let Some(uuid) = entry.get("uuid").and_then(|u| u.as_str())
            {
                return Some(uuid.to_string());
            }
        }
        None
    }

    fn truncate_at_uuid(
        &self,
        entries: &[TranscriptEntry],
        uuid: &str,
    ) -> Result<Vec<u8>, TranscriptError> {
        let position = entries
            .iter()
            .position(|e| e.get("uuid").and_then(|u| u.as_str()) == Some(uuid))
            .ok_or_else(|| TranscriptError::EntryNotFound {
                uuid: uuid.to_string(),
            })?;

        let mut out = String::new();
        for entry in &entries[..=position] {
            let line =
                serde_json::to_string(entry).map_err(|e| TranscriptError::ParseError {
                    message: e.to_string(),
                })?;
            out.push_str(&line);
            out.push('\n');
        }
        Ok(out.into_bytes())
    }

    fn format_resume_command(&self, agent_session_id: &str) -> String {
        format!("claude --resume {}", agent_session_id)
    }
}
