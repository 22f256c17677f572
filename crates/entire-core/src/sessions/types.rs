//! Session record types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::transcripts::types::AgentType;

/// Where a session is in its lifecycle.
///
/// `Active` while the agent works on top of `base_commit`;
/// `ActiveCommitted` once a user commit carrying this session's trailer is
/// in flight (prepare ran, finalize pending); `Condensed` after the shadow
/// branch has been folded into the metadata branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionPhase {
    Active,
    ActiveCommitted,
    Condensed,
}

/// One active agent interaction, persisted as a JSON file under
/// `.git/entire-sessions/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRecord {
    /// Exposed identity: the agent's raw session id with a `YYYY-MM-DD-`
    /// prefix prepended at creation.
    pub session_id: String,

    /// Which agent family owns the transcript.
    pub agent_type: AgentType,

    /// HEAD at session initialization. Never mutated while the session is
    /// on this commit; re-armed only when a condensed session resumes on a
    /// new HEAD.
    pub base_commit: String,

    /// Absolute path of the worktree this session runs in.
    pub worktree_path: PathBuf,

    /// Worktree fingerprint; empty for the main worktree.
    pub worktree_id: String,

    /// The agent's live transcript file.
    pub transcript_path: PathBuf,

    pub phase: SessionPhase,

    /// Number of shadow commits appended for this session on the current
    /// base commit.
    pub checkpoint_count: u32,

    /// Stable 12-hex id of the most recently condensed checkpoint; empty
    /// until the first condensation.
    #[serde(default)]
    pub last_checkpoint_id: String,

    /// Paths present in the worktree but untracked by HEAD when the
    /// session started, preserved across rewind.
    #[serde(default)]
    pub untracked_at_start: Vec<String>,

    /// RFC 3339 wall-clock timestamp.
    pub started_at: String,
}

impl SessionRecord {
    /// True while the session still owns (or may still grow) a shadow
    /// branch.
    pub fn is_active(&self) -> bool {
        matches!(self.phase, SessionPhase::Active | SessionPhase::ActiveCommitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(phase: SessionPhase) -> SessionRecord {
        SessionRecord {
            session_id: "2026-08-01-s1".to_string(),
            agent_type: AgentType::Claude,
            base_commit: "0123456789abcdef0123456789abcdef01234567".to_string(),
            worktree_path: PathBuf::from("/work/repo"),
            worktree_id: String::new(),
            transcript_path: PathBuf::from("/tmp/transcript.jsonl"),
            phase,
            checkpoint_count: 0,
            last_checkpoint_id: String::new(),
            untracked_at_start: vec![],
            started_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_is_active_per_phase() {
        assert!(record(SessionPhase::Active).is_active());
        assert!(record(SessionPhase::ActiveCommitted).is_active());
        assert!(!record(SessionPhase::Condensed).is_active());
    }

    #[test]
    fn test_phase_serializes_screaming_snake() {
        let json = serde_json::to_string(&SessionPhase::ActiveCommitted).unwrap();
        assert_eq!(json, "\"ACTIVE_COMMITTED\"");
        let back: SessionPhase = serde_json::from_str("\"CONDENSED\"").unwrap();
        assert_eq!(back, SessionPhase::Condensed);
    }

    #[test]
    fn test_record_round_trip() {
        let rec = record(SessionPhase::Active);
        let json = serde_json::to_string_pretty(&rec).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, rec);
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let json = r#"{
            "session_id": "2026-08-01-s1",
            "agent_type": "claude",
            "base_commit": "0123456789abcdef0123456789abcdef01234567",
            "worktree_path": "/work/repo",
            "worktree_id": "",
            "transcript_path": "/tmp/t.jsonl",
            "phase": "ACTIVE",
            "checkpoint_count": 2,
            "started_at": "2026-08-01T00:00:00Z"
        }"#;
        let rec: SessionRecord = serde_json::from_str(json).unwrap();
        assert!(rec.last_checkpoint_id.is_empty());
        assert!(rec.untracked_at_start.is_empty());
        assert_eq!(rec.checkpoint_count, 2);
    }
}
