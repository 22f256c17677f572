//! Reset and cleanup: discard shadow state without touching the working
//! tree.

use entire_git::ObjectStore;
use tracing::info;

use super::errors::RewindError;
use crate::identity;
use crate::sessions::{SessionError, SessionStore};
use crate::shadow::engine::find_session_by_raw_id;
use crate::trailers;

#[derive(Debug, PartialEq, Eq)]
pub struct ResetReport {
    pub branch_deleted: bool,
    pub sessions_cleared: usize,
}

/// Delete the shadow branch for the current HEAD and clear every session
/// record based on it.
pub fn reset(store: &ObjectStore, sessions: &SessionStore) -> Result<ResetReport, RewindError> {
    let _lock = sessions.lock()?;

    let head = store.head()?;
    let worktree_id = identity::worktree_id(store)?;
    let ref_name = identity::shadow_ref_name(head, &worktree_id);

    let branch_deleted = if store.lookup_ref(&ref_name)?.is_some() {
        store.remove_ref(&ref_name)?;
        true
    } else {
        false
    };

    let mut cleared = 0;
    for record in sessions.list()? {
        if record.base_commit == head.to_string() {
            sessions.clear(&record.session_id)?;
            cleared += 1;
        }
    }

    info!(
        event = "core.reset.completed",
        branch_deleted = branch_deleted,
        sessions_cleared = cleared,
    );
    Ok(ResetReport {
        branch_deleted,
        sessions_cleared: cleared,
    })
}

/// Clear one session record, addressed by exposed or raw id. The shadow
/// branch is left alone; orphan detection reclaims it later.
pub fn reset_session(sessions: &SessionStore, id: &str) -> Result<(), RewindError> {
    let _lock = sessions.lock()?;

    let record = match sessions.load(id)? {
        Some(record) => Some(record),
        None => find_session_by_raw_id(sessions, id)?,
    };
    let record = record.ok_or_else(|| SessionError::NotFound { id: id.to_string() })?;
    sessions.clear(&record.session_id)?;
    info!(event = "core.reset.session_cleared", session_id = %record.session_id);
    Ok(())
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct CleanReport {
    pub branches_deleted: Vec<String>,
    pub records_deleted: Vec<String>,
}

/// Garbage-collect: shadow branches with no live session record, and
/// session records whose base commit no longer resolves.
pub fn clean(store: &ObjectStore, sessions: &SessionStore) -> Result<CleanReport, RewindError> {
    let _lock = sessions.lock()?;
    let mut report = CleanReport::default();

    for (name, tip) in store.list_refs("refs/heads/entire/*")? {
        if name.starts_with("refs/heads/entire/checkpoints/") {
            continue;
        }
        let message = store.commit_object(tip)?.message;
        let live = match trailers::parse(&message, trailers::ENTIRE_SESSION) {
            Some(eid) => sessions.load(&eid)?.is_some(),
            None => false,
        };
        if !live {
            store.remove_ref(&name)?;
            report.branches_deleted.push(name);
        }
    }

    for record in sessions.list()? {
        let stale = match git2::Oid::from_str(&record.base_commit) {
            Ok(oid) => !store.commit_exists(oid),
            Err(_) => true,
        };
        if stale {
            sessions.clear(&record.session_id)?;
            report.records_deleted.push(record.session_id);
        }
    }

    if !report.branches_deleted.is_empty() || !report.records_deleted.is_empty() {
        info!(
            event = "core.clean.completed",
            branches = report.branches_deleted.len(),
            records = report.records_deleted.len(),
        );
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
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

    fn start(store: &ObjectStore, sessions: &SessionStore, raw: &str) -> String {
        initialize_session(
            store,
            sessions,
            &InitRequest {
                raw_session_id: raw.to_string(),
                agent_type: AgentType::Claude,
                transcript_path: PathBuf::from("/tmp/t.jsonl"),
            },
        )
        .unwrap()
        .record
        .session_id
    }

    #[test]
    fn test_reset_deletes_branch_and_records() {
        let (dir, store, sessions) = fixture();
        let eid = start(&store, &sessions, "s1");
        std::fs::write(dir.path().join("a.go"), "one").unwrap();
        append_checkpoint(&store, &sessions, &eid).unwrap();

        let head = store.head().unwrap();
        let report = reset(&store, &sessions).unwrap();
        assert_eq!(
            report,
            ResetReport {
                branch_deleted: true,
                sessions_cleared: 1
            }
        );
        assert!(store
            .lookup_ref(&identity::shadow_ref_name(head, ""))
            .unwrap()
            .is_none());
        assert!(sessions.load(&eid).unwrap().is_none());

        // Idempotent: nothing left to clear.
        let again = reset(&store, &sessions).unwrap();
        assert_eq!(
            again,
            ResetReport {
                branch_deleted: false,
                sessions_cleared: 0
            }
        );
    }

    #[test]
    fn test_reset_session_clears_only_target() {
        let (_dir, store, sessions) = fixture();
        let a = start(&store, &sessions, "sa");
        let b = start(&store, &sessions, "sb");

        // Addressable by raw id as well as exposed id.
        reset_session(&sessions, "sa").unwrap();
        assert!(sessions.load(&a).unwrap().is_none());
        assert!(sessions.load(&b).unwrap().is_some());

        let missing = reset_session(&sessions, "sa");
        assert!(matches!(
            missing,
            Err(RewindError::Session {
                source: SessionError::NotFound { .. }
            })
        ));
    }

    #[test]
    fn test_clean_removes_orphan_branch_and_stale_record() {
        let (dir, store, sessions) = fixture();

        // Orphan shadow branch: trailer references no live record.
        let eid = start(&store, &sessions, "s1");
        std::fs::write(dir.path().join("a.go"), "one").unwrap();
        append_checkpoint(&store, &sessions, &eid).unwrap();
        sessions.clear(&eid).unwrap();

        // Stale record: base commit that cannot resolve. Saved directly so
        // session initialization doesn't reconcile the orphan first.
        let stale = "2026-08-01-s2".to_string();
        let record = crate::sessions::types::SessionRecord {
            session_id: stale.clone(),
            agent_type: AgentType::Claude,
            base_commit: "1111111111111111111111111111111111111111".to_string(),
            worktree_path: dir.path().to_path_buf(),
            worktree_id: String::new(),
            transcript_path: PathBuf::from("/tmp/t.jsonl"),
            phase: crate::sessions::types::SessionPhase::Active,
            checkpoint_count: 0,
            last_checkpoint_id: String::new(),
            untracked_at_start: vec![],
            started_at: "2026-08-01T00:00:00Z".to_string(),
        };
        sessions.save(&record).unwrap();

        let report = clean(&store, &sessions).unwrap();
        assert_eq!(report.branches_deleted.len(), 1);
        assert_eq!(report.records_deleted, vec![stale]);

        // The metadata branch is never collected.
        let head = store.head().unwrap();
        assert!(store
            .lookup_ref(&identity::shadow_ref_name(head, ""))
            .unwrap()
            .is_none());
    }
}
