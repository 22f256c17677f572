//! Session store: the directory of record files plus the mutation lock.

use std::path::{Path, PathBuf};

use entire_git::ObjectStore;

use super::errors::SessionError;
use super::lock::{self, SessionLock};
use super::persistence;
use super::types::SessionRecord;
use crate::identity;

/// Handle on a worktree's session records under
/// `<gitdir>/entire-sessions/`. Linked worktrees get their own directory
/// (and therefore their own lock) via the per-worktree gitdir.
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn for_repo(store: &ObjectStore) -> Self {
        Self {
            dir: store.git_dir().join(identity::SESSIONS_DIR),
        }
    }

    /// Open a store rooted at an explicit directory (tests, tooling).
    pub fn at(dir: PathBuf) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Take the exclusive mutation lock. Hold the guard across every
    /// multi-step mutation (shadow append, condensation).
    pub fn lock(&self) -> Result<SessionLock, SessionError> {
        lock::acquire(&self.dir)
    }

    pub fn load(&self, session_id: &str) -> Result<Option<SessionRecord>, SessionError> {
        persistence::load_record(session_id, &self.dir)
    }

    /// Persist a record. Callers must hold the lock.
    pub fn save(&self, record: &SessionRecord) -> Result<(), SessionError> {
        persistence::save_record(record, &self.dir)
    }

    /// Delete a record. Absent records are fine. Callers must hold the lock.
    pub fn clear(&self, session_id: &str) -> Result<(), SessionError> {
        persistence::remove_record(session_id, &self.dir)
    }

    pub fn list(&self) -> Result<Vec<SessionRecord>, SessionError> {
        let (records, _skipped) = persistence::list_records(&self.dir)?;
        Ok(records)
    }

    /// Active sessions on a given worktree + base commit, other than
    /// `excluding`. Feeds the concurrent-session warning.
    pub fn other_active_sessions(
        &self,
        worktree_id: &str,
        base_commit: &str,
        excluding: &str,
    ) -> Result<Vec<SessionRecord>, SessionError> {
        let records = self.list()?;
        Ok(records
            .into_iter()
            .filter(|r| {
                r.is_active()
                    && r.worktree_id == worktree_id
                    && r.base_commit == base_commit
                    && r.session_id != excluding
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::types::SessionPhase;
    use crate::transcripts::types::AgentType;
    use tempfile::TempDir;

    fn record(id: &str, base: &str, worktree_id: &str, count: u32) -> SessionRecord {
        SessionRecord {
            session_id: id.to_string(),
            agent_type: AgentType::Claude,
            base_commit: base.to_string(),
            worktree_path: PathBuf::from("/work/repo"),
            worktree_id: worktree_id.to_string(),
            transcript_path: PathBuf::from("/tmp/t.jsonl"),
            phase: SessionPhase::Active,
            checkpoint_count: count,
            last_checkpoint_id: String::new(),
            untracked_at_start: vec![],
            started_at: "2026-08-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_store_save_load_clear() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("entire-sessions"));

        let rec = record("2026-08-01-a", "aaaa", "", 0);
        store.save(&rec).unwrap();
        assert_eq!(store.load("2026-08-01-a").unwrap(), Some(rec));

        store.clear("2026-08-01-a").unwrap();
        assert_eq!(store.load("2026-08-01-a").unwrap(), None);
    }

    #[test]
    fn test_other_active_sessions_filters() {
        let dir = TempDir::new().unwrap();
        let store = SessionStore::at(dir.path().join("entire-sessions"));

        store.save(&record("2026-08-01-me", "aaaa", "", 1)).unwrap();
        store.save(&record("2026-08-01-other", "aaaa", "", 2)).unwrap();
        store.save(&record("2026-08-01-elsewhere", "bbbb", "", 2)).unwrap();
        store.save(&record("2026-08-01-linked", "aaaa", "w1", 2)).unwrap();

        let mut condensed = record("2026-08-01-done", "aaaa", "", 3);
        condensed.phase = SessionPhase::Condensed;
        store.save(&condensed).unwrap();

        let others = store
            .other_active_sessions("", "aaaa", "2026-08-01-me")
            .unwrap();
        assert_eq!(others.len(), 1);
        assert_eq!(others[0].session_id, "2026-08-01-other");
    }
}
