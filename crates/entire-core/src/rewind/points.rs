//! Rewind point projection.
//!
//! Replayable points are the shadow commits of the current HEAD's shadow
//! branch (tip down to, excluding, the base commit). Logs-only points are
//! condensed checkpoints on the metadata branch whose base commit still
//! resolves in this repository; their trees were retired, only metadata
//! remains.

use entire_git::ObjectStore;

use super::errors::RewindError;
use crate::condense::metadata;
use crate::identity;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewindPoint {
    /// Shadow commit id (replayable) or checkpoint id (logs-only).
    pub id: String,
    /// Commit time (replayable) or metadata `created_at` (logs-only).
    pub timestamp: String,
    pub is_logs_only: bool,
    /// The condensed checkpoint id; empty for shadow points that have not
    /// condensed yet.
    pub condensation_id: String,
}

/// All rewind points visible from the current HEAD and worktree, shadow
/// points first (newest to oldest), then logs-only checkpoints.
pub fn list_rewind_points(store: &ObjectStore) -> Result<Vec<RewindPoint>, RewindError> {
    let mut points = Vec::new();

    let head = store.head()?;
    let worktree_id = identity::worktree_id(store)?;
    let ref_name = identity::shadow_ref_name(head, &worktree_id);

    if let Some(tip) = store.lookup_ref(&ref_name)? {
        for commit in store.walk(tip, Some(head))? {
            let info = store.commit_object(commit)?;
            let timestamp = chrono::DateTime::from_timestamp(info.seconds, 0)
                .map(|t| t.to_rfc3339())
                .unwrap_or_default();
            points.push(RewindPoint {
                id: commit.to_string()[..12].to_string(),
                timestamp,
                is_logs_only: false,
                condensation_id: String::new(),
            });
        }
    }

    for info in metadata::list_checkpoints(store)? {
        let Ok(base) = git2::Oid::from_str(&info.base_commit) else {
            continue;
        };
        if !store.commit_exists(base) {
            continue;
        }
        points.push(RewindPoint {
            id: info.checkpoint_id.clone(),
            timestamp: info.created_at.clone(),
            is_logs_only: true,
            condensation_id: info.checkpoint_id,
        });
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sessions::SessionStore;
    use crate::shadow::{append_checkpoint, initialize_session, InitRequest};
    use crate::transcripts::types::AgentType;
    use entire_git::test_support;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ObjectStore, SessionStore) {
        let dir = TempDir::new().unwrap();
        test_support::init_repo_with_commit(dir.path()).unwrap();
        test_support::commit_file(dir.path(), "README.md", "# repo\n", "Add readme").unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        let sessions = SessionStore::for_repo(&store);
        (dir, store, sessions)
    }

    #[test]
    fn test_no_points_on_clean_repo() {
        let (_dir, store, _sessions) = fixture();
        assert!(list_rewind_points(&store).unwrap().is_empty());
    }

    #[test]
    fn test_shadow_points_newest_first() {
        let (dir, store, sessions) = fixture();
        let outcome = initialize_session(
            &store,
            &sessions,
            &InitRequest {
                raw_session_id: "s1".to_string(),
                agent_type: AgentType::Claude,
                transcript_path: PathBuf::from("/tmp/t.jsonl"),
            },
        )
        .unwrap();
        let eid = outcome.record.session_id;

        std::fs::write(dir.path().join("a.go"), "one").unwrap();
        append_checkpoint(&store, &sessions, &eid).unwrap();
        std::fs::write(dir.path().join("a.go"), "two").unwrap();
        append_checkpoint(&store, &sessions, &eid).unwrap();

        let points = list_rewind_points(&store).unwrap();
        assert_eq!(points.len(), 2);
        assert!(points.iter().all(|p| !p.is_logs_only));

        let head = store.head().unwrap();
        let tip = store
            .lookup_ref(&identity::shadow_ref_name(head, ""))
            .unwrap()
            .unwrap();
        assert_eq!(points[0].id, tip.to_string()[..12]);
    }
}
