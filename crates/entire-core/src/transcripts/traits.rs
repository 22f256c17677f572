//! The transcript adapter capability set.

use std::collections::BTreeSet;
use std::path::Path;

use super::errors::TranscriptError;
use super::types::AgentType;

/// One parsed transcript entry. The engine treats entries as opaque JSON;
/// only the adapters know the field layout.
pub type TranscriptEntry = serde_json::Value;

/// Agent-specific knowledge about transcript files.
///
/// The engine needs exactly this: parse the native bytes, derive the files
/// the agent modified, pull user prompts for checkpoint metadata, map a
/// tool-use id back to an entry uuid, and truncate the transcript at an
/// entry when rewinding.
pub trait TranscriptAdapter: Send + Sync {
    fn agent_type(&self) -> AgentType;

    /// File extension of the native transcript format (no leading dot).
    fn transcript_extension(&self) -> &'static str;

    fn parse(&self, bytes: &[u8]) -> Result<Vec<TranscriptEntry>, TranscriptError>;

    /// Write native transcript bytes back to disk.
    fn write(&self, path: &Path, bytes: &[u8]) -> Result<(), TranscriptError> {
        std::fs::write(path, bytes)?;
        Ok(())
    }

    /// Worktree-relative or absolute paths of files the agent wrote or
    /// edited, in entry order, deduplicated.
    fn derive_modified_files(&self, entries: &[TranscriptEntry]) -> BTreeSet<String>;

    /// The first user prompt of the session (feeds `prompt.txt`).
    fn first_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String>;

    /// The most recent user prompt.
    fn last_user_prompt(&self, entries: &[TranscriptEntry]) -> Option<String>;

    /// Uuid of the entry that carries the given tool-use id.
    fn find_checkpoint_uuid(
        &self,
        entries: &[TranscriptEntry],
        tool_use_id: &str,
    ) -> Option<String>;

    /// Native bytes of the transcript truncated after the entry with
    /// `uuid` (inclusive).
    fn truncate_at_uuid(
        &self,
        entries: &[TranscriptEntry],
        uuid: &str,
    ) -> Result<Vec<u8>, TranscriptError>;

    /// Shell command the user can run to resume the agent session.
    fn format_resume_command(&self, agent_session_id: &str) -> String;
}
