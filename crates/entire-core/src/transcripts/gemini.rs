//! Transcript adapter for Gemini CLI.
//!
//! Gemini transcripts are a single JSON array of message objects:
//! `{"id": "...", "type": "user" | "gemini", "content": "...",
//!   "toolCalls": [{"id", "name", "args": {"file_path": ...}}]}`.

use std::collections::BTreeSet;

use super::errors::TranscriptError;
use super::traits::{TranscriptAdapter, TranscriptEntry};
use super::types::AgentType;

const FILE_WRITING_TOOLS: &[&str] = &["write_file", "replace", "edit"];

pub struct GeminiAdapter;

impl GeminiAdapter {
    fn prompt_text(entry: &TranscriptEntry) -> Option<String> {
        if entry.get("type")?.as_str()? != "user" {
            return None;
        }
        entry
            .get("content")
            .and_then(|c| c.as_str())
            .map(str::to_string)
    }
}

impl TranscriptAdapter for GeminiAdapter {
    fn agent_type(&self) -> AgentType {
        AgentType::Gemini
    }

    fn transcript_extension(&self) -> &'static str {
        "json"
    }

    fn parse(&self, bytes: &[u8]) -> Result<Vec<TranscriptEntry>, TranscriptError> {
        let value: serde_json::Value =
            serde_json::from_slice(bytes).map_err(|e| TranscriptError::ParseError {
                message: e.to_string(),
            })?;
        match value {
            serde_json::Value::Array(entries) => Ok(entries),
            _ => Err(TranscriptError::ParseError {
                message: "expected a top-level JSON array of messages".to_string(),
            }),
        }
    }

    fn derive_modified_files(&self, entries: &[TranscriptEntry]) -> BTreeSet<String> {
        let mut files = BTreeSet::new();
        for entry in entries {
            let Some(calls) = entry.get("toolCalls").and_then(|c| c.as_array()) else {
                continue;
            };
            for call in calls {
                let name = call.get("name").and_then(|n| n.as_str()).unwrap_or("");
                if !FILE_WRITING_TOOLS.contains(&name) {
                    continue;
                }
                if let Some(path) = call
                    .get("args")
                    .and_then(|a| a.get("file_path"))
                    .and_then(|p| p.as_str())
                {
                    files.insert(path.to_string());
                }
            }
        }
        files
    }

    fn first_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String> {
        entries.iter().find_map(Self::prompt_text)
    }

    fn last_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String> {
        entries.iter().rev().find_map(Self::prompt_text)
    }

    fn find_checkpoint_uuid(
        &self,
        entries: &[TranscriptEntry],
        tool_use_id: &str,
    ) -> Option<String> {
        for entry in entries {
            let Some(calls) = entry.get("toolCalls").and_then(|c| c.as_array()) else {
                continue;
            };
            let matches = calls
                .iter()
                .any(|c| c.get("id").and_then(|i| i.as_str()) == Some(tool_use_id));
            if matches
                && let Some(id) = entry.get("id").and_then(|i| i.as_str())
            {
                return Some(id.to_string());
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
            .position(|e| e.get("id").and_then(|i| i.as_str()) == Some(uuid))
            .ok_or_else(|| TranscriptError::EntryNotFound {
                uuid: uuid.to_string(),
            })?;
        serde_json::to_vec_pretty(&entries[..=position]).map_err(|e| {
            TranscriptError::ParseError {
                message: e.to_string(),
            }
        })
    }

    fn format_resume_command(&self, agent_session_id: &str) -> String {
        format!("gemini --resume {}", agent_session_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<u8> {
        serde_json::to_vec(&serde_json::json!([
            {"id": "m1", "type": "user", "content": "add a parser"},
            {"id": "m2", "type": "gemini", "content": "writing it",
             "toolCalls": [{"id": "call_1", "name": "write_file",
                            "args": {"file_path": "parser.go", "content": "..."}}]},
            {"id": "m3", "type": "user", "content": "looks good"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_parse_rejects_non_array() {
        let result = GeminiAdapter.parse(br#"{"messages": []}"#);
        assert!(matches!(result, Err(TranscriptError::ParseError { .. })));
    }

    #[test]
    fn test_modified_files_and_prompts() {
        let entries = GeminiAdapter.parse(&sample()).unwrap();
        let files = GeminiAdapter.derive_modified_files(&entries);
        assert!(files.contains("parser.go"));
        assert_eq!(
            GeminiAdapter.first_user_prompt(&entries).as_deref(),
            Some("add a parser")
        );
        assert_eq!(
            GeminiAdapter.last_user_prompt(&entries).as_deref(),
            Some("looks good")
        );
    }

    #[test]
    fn test_find_and_truncate() {
        let entries = GeminiAdapter.parse(&sample()).unwrap();
        assert_eq!(
            GeminiAdapter.find_checkpoint_uuid(&entries, "call_1").as_deref(),
            Some("m2")
        );

        let bytes = GeminiAdapter.truncate_at_uuid(&entries, "m2").unwrap();
        let reparsed = GeminiAdapter.parse(&bytes).unwrap();
        assert_eq!(reparsed.len(), 2);
    }
}
