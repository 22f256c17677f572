//! Session initialization and shadow checkpoint capture.
//!
//! `initialize_session` runs on `UserPromptSubmit`: create or resume the
//! record, then reconcile the shadow branch for the current HEAD (live,
//! conflicting, or orphaned). `append_checkpoint` runs on `Stop`: snapshot
//! the working tree and append one commit to the shadow branch unless the
//! change set is empty or entirely user-replaced content.

use std::path::PathBuf;

use entire_git::ObjectStore;
use tracing::{info, warn};

use super::errors::ShadowError;
use super::{overlap, snapshot};
use crate::identity;
use crate::sessions::types::{SessionPhase, SessionRecord};
use crate::sessions::{SessionError, SessionStore};
use crate::trailers;
use crate::transcripts;
use crate::transcripts::types::AgentType;

/// Inputs for session initialization, straight from the hook payload.
#[derive(Debug, Clone)]
pub struct InitRequest {
    /// The agent's raw session id, without the date prefix.
    pub raw_session_id: String,
    pub agent_type: AgentType,
    pub transcript_path: PathBuf,
}

/// Another live session already owns the shadow branch for this HEAD.
#[derive(Debug, Clone)]
pub struct ConflictInfo {
    pub existing_session_id: String,
}

/// What `initialize_session` did.
#[derive(Debug)]
pub struct InitOutcome {
    pub record: SessionRecord,
    /// An existing record for this session id was reused.
    pub resumed: bool,
    /// An orphaned shadow branch was deleted before proceeding.
    pub orphan_reset: bool,
    pub conflict: Option<ConflictInfo>,
}

/// What `append_checkpoint` did.
#[derive(Debug, PartialEq, Eq)]
pub enum AppendOutcome {
    /// Working tree identical to the previous checkpoint.
    NoChanges,
    /// Every touched path was new with no content written by this
    /// session; the user replaced the agent's work, nothing to record.
    SkippedReplacedContent,
    Appended {
        commit: git2::Oid,
        touched: Vec<String>,
        count: u32,
    },
}

/// Find a record by the agent's raw session id, regardless of which date
/// it was first prefixed with.
pub fn find_session_by_raw_id(
    sessions: &SessionStore,
    raw_session_id: &str,
) -> Result<Option<SessionRecord>, SessionError> {
    let records = sessions.list()?;
    Ok(records
        .into_iter()
        .find(|r| identity::extract_agent_session_id(&r.session_id) == raw_session_id))
}

/// Initialize or resume a session on the current HEAD (the
/// `UserPromptSubmit` path). Idempotent for an unchanged HEAD; re-arms a
/// condensed or stale record when HEAD moved on.
pub fn initialize_session(
    store: &ObjectStore,
    sessions: &SessionStore,
    request: &InitRequest,
) -> Result<InitOutcome, ShadowError> {
    let _lock = sessions.lock()?;

    let head = store.head()?;
    let worktree_id = identity::worktree_id(store)?;
    let worktree_path = store.workdir()?;

    let (record, resumed) = match find_session_by_raw_id(sessions, &request.raw_session_id)? {
        Some(existing) if existing.base_commit == head.to_string() => (existing, true),
        Some(mut stale) => {
            // The session outlived its base commit (condensed, or the user
            // committed without keeping any agent content). Re-arm it on
            // the new HEAD; last_checkpoint_id survives for amend
            // restoration.
            info!(
                event = "core.shadow.session_rearmed",
                session_id = %stale.session_id,
                old_base = %stale.base_commit,
                new_base = %head,
            );
            stale.base_commit = head.to_string();
            stale.phase = SessionPhase::Active;
            stale.checkpoint_count = 0;
            stale.untracked_at_start = snapshot::untracked_paths(store)?;
            stale.transcript_path = request.transcript_path.clone();
            sessions.save(&stale)?;
            (stale, true)
        }
        None => {
            let record = SessionRecord {
                session_id: identity::entire_session_id(&request.raw_session_id),
                agent_type: request.agent_type,
                base_commit: head.to_string(),
                worktree_path,
                worktree_id: worktree_id.clone(),
                transcript_path: request.transcript_path.clone(),
                phase: SessionPhase::Active,
                checkpoint_count: 0,
                last_checkpoint_id: String::new(),
                untracked_at_start: snapshot::untracked_paths(store)?,
                started_at: chrono::Utc::now().to_rfc3339(),
            };
            sessions.save(&record)?;
            info!(
                event = "core.shadow.session_created",
                session_id = %record.session_id,
                base_commit = %head,
            );
            (record, false)
        }
    };

    let (orphan_reset, conflict) = reconcile_shadow_branch(store, sessions, &record, head)?;

    Ok(InitOutcome {
        record,
        resumed,
        orphan_reset,
        conflict,
    })
}

/// Examine the shadow branch for the current HEAD: keep it when it is
/// ours, report a conflict when another live session owns it, delete it
/// when orphaned.
fn reconcile_shadow_branch(
    store: &ObjectStore,
    sessions: &SessionStore,
    record: &SessionRecord,
    head: git2::Oid,
) -> Result<(bool, Option<ConflictInfo>), ShadowError> {
    let ref_name = identity::shadow_ref_name(head, &record.worktree_id);
    let Some(tip) = store.lookup_ref(&ref_name)? else {
        return Ok((false, None));
    };

    let tip_info = store.commit_object(tip)?;
    let owner = trailers::parse(&tip_info.message, trailers::ENTIRE_SESSION);

    if let Some(owner_id) = owner {
        if owner_id == record.session_id {
            return Ok((false, None));
        }
        if sessions.load(&owner_id)?.is_some() {
            warn!(
                event = "core.shadow.active_session_conflict",
                branch = %ref_name,
                existing_session = %owner_id,
                new_session = %record.session_id,
            );
            return Ok((
                false,
                Some(ConflictInfo {
                    existing_session_id: owner_id,
                }),
            ));
        }
    }

    // No trailer (pre-trailer shadow branch) or no live record: orphan.
    info!(
        event = "core.shadow.orphan_branch_reset",
        branch = %ref_name,
    );
    store.remove_ref(&ref_name)?;
    Ok((true, None))
}

/// Warning text for the `SessionStart` hook when another session on the
/// same worktree and base commit already has checkpoints.
pub fn session_start_warning(
    store: &ObjectStore,
    sessions: &SessionStore,
    raw_session_id: &str,
) -> Result<Option<String>, ShadowError> {
    let head = store.head()?;
    let worktree_id = identity::worktree_id(store)?;
    let new_eid = identity::entire_session_id(raw_session_id);

    let others = sessions.other_active_sessions(&worktree_id, &head.to_string(), &new_eid)?;
    let Some(existing) = others
        .iter()
        .find(|r| r.checkpoint_count > 0 && identity::extract_agent_session_id(&r.session_id) != raw_session_id)
    else {
        return Ok(None);
    };

    let resume = transcripts::adapter_for(existing.agent_type)
        .map(|a| {
            a.format_resume_command(identity::extract_agent_session_id(&existing.session_id))
        })
        .unwrap_or_default();

    Ok(Some(format!(
        "Another session ({existing}) already has {count} checkpoint(s) on this commit. \
         Starting session {new} here will interleave checkpoints. \
         Resume the previous session with `{resume}`, discard its checkpoints with \
         `entire reset`, or disable checkpointing with `entire disable`.",
        existing = existing.session_id,
        count = existing.checkpoint_count,
        new = new_eid,
        resume = resume,
    )))
}

/// Append a shadow checkpoint for the session (the `Stop` path).
pub fn append_checkpoint(
    store: &ObjectStore,
    sessions: &SessionStore,
    session_id: &str,
) -> Result<AppendOutcome, ShadowError> {
    let _lock = sessions.lock()?;

    let mut record = sessions
        .load(session_id)?
        .ok_or_else(|| SessionError::NotFound {
            id: session_id.to_string(),
        })?;

    let base = store.resolve_commit(&record.base_commit)?;
    let base_tree = store.commit_object(base)?.tree_id;
    let ref_name = identity::shadow_ref_name(base, &record.worktree_id);

    let tip = store.lookup_ref(&ref_name)?;
    let parent = tip.unwrap_or(base);
    let parent_tree = store.commit_object(parent)?.tree_id;

    let head = store.head()?;
    let head_tree = store.commit_object(head)?.tree_id;
    let snapshot_tree = snapshot::capture(store, head_tree)?;

    let changes = store.diff_trees(parent_tree, snapshot_tree)?;
    if changes.is_empty() {
        return Ok(AppendOutcome::NoChanges);
    }

    let touched = overlap::classify_changes(store, base_tree, snapshot_tree, &changes)?;
    if record.checkpoint_count > 0
        && let Some(tip) = tip
        && overlap::is_replaced_content(store, tip, base, &touched)?
    {
        info!(
            event = "core.shadow.checkpoint_skipped_replaced",
            session_id = %record.session_id,
            touched = touched.len(),
        );
        return Ok(AppendOutcome::SkippedReplacedContent);
    }

    let count = record.checkpoint_count + 1;
    let message = format!(
        "Checkpoint {}\n\nEntire-Session: {}\nEntire-Strategy: {}\n",
        count,
        record.session_id,
        identity::STRATEGY_MANUAL_COMMIT,
    );
    let commit = store.make_commit(snapshot_tree, &[parent], &message)?;
    store.set_ref(&ref_name, commit, &format!("entire: checkpoint {}", count))?;

    record.checkpoint_count = count;
    sessions.save(&record)?;

    info!(
        event = "core.shadow.checkpoint_appended",
        session_id = %record.session_id,
        commit = %commit,
        count = count,
    );

    Ok(AppendOutcome::Appended {
        commit,
        touched: touched.into_iter().map(|t| t.path).collect(),
        count,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use entire_git::test_support;
    use tempfile::TempDir;

    struct Fixture {
        dir: TempDir,
        store: ObjectStore,
        sessions: SessionStore,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        test_support::init_repo_with_commit(dir.path()).unwrap();
        test_support::commit_file(dir.path(), "README.md", "# repo\n", "Add readme").unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        let sessions = SessionStore::for_repo(&store);
        Fixture {
            dir,
            store,
            sessions,
        }
    }

    fn request(raw: &str) -> InitRequest {
        InitRequest {
            raw_session_id: raw.to_string(),
            agent_type: AgentType::Claude,
            transcript_path: PathBuf::from("/tmp/t.jsonl"),
        }
    }

    #[test]
    fn test_initialize_creates_record() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();

        assert!(!outcome.resumed);
        assert!(!outcome.orphan_reset);
        assert!(outcome.conflict.is_none());
        assert_eq!(
            identity::extract_agent_session_id(&outcome.record.session_id),
            "s1"
        );
        assert_eq!(outcome.record.phase, SessionPhase::Active);
        assert_eq!(
            outcome.record.base_commit,
            f.store.head().unwrap().to_string()
        );
    }

    #[test]
    fn test_initialize_is_idempotent() {
        let f = fixture();
        let first = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let second = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();

        assert!(second.resumed);
        assert_eq!(first.record, second.record);
        assert_eq!(f.sessions.list().unwrap().len(), 1);
    }

    #[test]
    fn test_initialize_captures_untracked_at_start() {
        let f = fixture();
        std::fs::write(f.dir.path().join("scratch.txt"), "pre-existing").unwrap();

        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        assert_eq!(outcome.record.untracked_at_start, vec!["scratch.txt".to_string()]);
    }

    #[test]
    fn test_append_first_checkpoint() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let eid = outcome.record.session_id.clone();

        std::fs::write(f.dir.path().join("hello.go"), "package main\n").unwrap();
        let result = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();

        let AppendOutcome::Appended { commit, touched, count } = result else {
            panic!("expected Appended, got {:?}", result);
        };
        assert_eq!(count, 1);
        assert_eq!(touched, vec!["hello.go".to_string()]);

        // Shadow branch exists, parented on base, trailers in place.
        let base = f.store.head().unwrap();
        let ref_name = identity::shadow_ref_name(base, "");
        assert_eq!(f.store.lookup_ref(&ref_name).unwrap(), Some(commit));

        let info = f.store.commit_object(commit).unwrap();
        assert_eq!(info.parent_ids, vec![base]);
        assert_eq!(
            trailers::parse(&info.message, trailers::ENTIRE_SESSION),
            Some(eid.clone())
        );
        assert_eq!(
            trailers::parse(&info.message, trailers::ENTIRE_STRATEGY).as_deref(),
            Some("manual-commit")
        );

        let record = f.sessions.load(&eid).unwrap().unwrap();
        assert_eq!(record.checkpoint_count, 1);
    }

    #[test]
    fn test_append_no_changes_makes_no_commit() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let eid = outcome.record.session_id.clone();

        let result = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();
        assert_eq!(result, AppendOutcome::NoChanges);

        let base = f.store.head().unwrap();
        assert!(f
            .store
            .lookup_ref(&identity::shadow_ref_name(base, ""))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_append_chains_checkpoints() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let eid = outcome.record.session_id.clone();

        std::fs::write(f.dir.path().join("a.go"), "one").unwrap();
        let first = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();
        std::fs::write(f.dir.path().join("a.go"), "two").unwrap();
        let second = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();

        let AppendOutcome::Appended { commit: c1, .. } = first else {
            panic!();
        };
        let AppendOutcome::Appended { commit: c2, count, .. } = second else {
            panic!();
        };
        assert_eq!(count, 2);
        assert_eq!(f.store.commit_object(c2).unwrap().parent_ids, vec![c1]);
    }

    #[test]
    fn test_append_skips_replaced_new_content() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let eid = outcome.record.session_id.clone();

        // Agent writes x.go, checkpointed.
        std::fs::write(f.dir.path().join("x.go"), "A").unwrap();
        append_checkpoint(&f.store, &f.sessions, &eid).unwrap();

        // User replaces the agent's new file with unrelated content.
        std::fs::write(f.dir.path().join("x.go"), "B").unwrap();
        let result = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();
        assert_eq!(result, AppendOutcome::SkippedReplacedContent);

        let record = f.sessions.load(&eid).unwrap().unwrap();
        assert_eq!(record.checkpoint_count, 1);
    }

    #[test]
    fn test_append_modified_tracked_file_not_skipped() {
        let f = fixture();
        let outcome = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let eid = outcome.record.session_id.clone();

        std::fs::write(f.dir.path().join("x.go"), "A").unwrap();
        append_checkpoint(&f.store, &f.sessions, &eid).unwrap();

        // README.md is tracked in base: always overlap.
        std::fs::write(f.dir.path().join("README.md"), "# user edit\n").unwrap();
        let result = append_checkpoint(&f.store, &f.sessions, &eid).unwrap();
        assert!(matches!(result, AppendOutcome::Appended { count: 2, .. }));
    }

    #[test]
    fn test_orphan_shadow_branch_reset_on_new_session() {
        let f = fixture();
        let head = f.store.head().unwrap();

        // Parentless commit masquerading as a shadow tip, no session state.
        let tree = f.store.commit_object(head).unwrap().tree_id;
        let orphan = f.store.make_commit(tree, &[], "stray").unwrap();
        let ref_name = identity::shadow_ref_name(head, "");
        f.store.set_ref(&ref_name, orphan, "test").unwrap();

        let outcome = initialize_session(&f.store, &f.sessions, &request("s-new")).unwrap();
        assert!(outcome.orphan_reset);
        assert!(f.store.lookup_ref(&ref_name).unwrap().is_none());

        // Subsequent Stop appends cleanly.
        std::fs::write(f.dir.path().join("fresh.go"), "go").unwrap();
        let result =
            append_checkpoint(&f.store, &f.sessions, &outcome.record.session_id).unwrap();
        assert!(matches!(result, AppendOutcome::Appended { count: 1, .. }));
    }

    #[test]
    fn test_conflict_when_other_live_session_owns_branch() {
        let f = fixture();

        let s1 = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        std::fs::write(f.dir.path().join("work.go"), "s1 work").unwrap();
        append_checkpoint(&f.store, &f.sessions, &s1.record.session_id).unwrap();

        let s2 = initialize_session(&f.store, &f.sessions, &request("s2")).unwrap();
        let conflict = s2.conflict.expect("conflict expected");
        assert_eq!(conflict.existing_session_id, s1.record.session_id);

        // The existing branch was left alone.
        let head = f.store.head().unwrap();
        assert!(f
            .store
            .lookup_ref(&identity::shadow_ref_name(head, ""))
            .unwrap()
            .is_some());
    }

    #[test]
    fn test_session_start_warning_mentions_resume() {
        let f = fixture();
        let s1 = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        std::fs::write(f.dir.path().join("work.go"), "s1 work").unwrap();
        append_checkpoint(&f.store, &f.sessions, &s1.record.session_id).unwrap();

        let warning = session_start_warning(&f.store, &f.sessions, "s2")
            .unwrap()
            .expect("warning expected");
        assert!(warning.contains(&s1.record.session_id));
        assert!(warning.contains("claude --resume s1"));
        assert!(warning.contains("entire reset"));
        assert!(warning.contains("entire disable"));

        // No warning without checkpoints.
        let g = fixture();
        initialize_session(&g.store, &g.sessions, &request("s1")).unwrap();
        assert!(session_start_warning(&g.store, &g.sessions, "s2").unwrap().is_none());
    }

    #[test]
    fn test_rearm_after_base_moves() {
        let f = fixture();
        let s1 = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        let old_base = s1.record.base_commit.clone();

        test_support::commit_file(f.dir.path(), "user.txt", "user", "User commit").unwrap();

        let resumed = initialize_session(&f.store, &f.sessions, &request("s1")).unwrap();
        assert!(resumed.resumed);
        assert_ne!(resumed.record.base_commit, old_base);
        assert_eq!(resumed.record.phase, SessionPhase::Active);
        assert_eq!(resumed.record.checkpoint_count, 0);
    }
}
