//! Rewind: restore the working tree to a prior shadow checkpoint.

use std::collections::BTreeSet;

use entire_git::ObjectStore;
use tracing::info;

use super::errors::RewindError;
use crate::condense::metadata;
use crate::identity;
use crate::sessions::types::SessionPhase;
use crate::sessions::SessionStore;
use crate::shadow::snapshot;
use crate::trailers;

#[derive(Debug, PartialEq, Eq)]
pub struct RewindReport {
    pub restored_files: usize,
    pub deleted_files: usize,
    /// Checkpoint count after truncating the shadow branch; 0 when the
    /// rewind target was the base commit itself.
    pub checkpoint_count: u32,
    /// The session record was cleared (rewind to pre-session state).
    pub session_cleared: bool,
}

/// Rewind the working tree to `id`: a shadow commit (full or abbreviated
/// hex) on the current HEAD's shadow branch, or the base commit itself
/// for a full unwind. Condensed checkpoint ids fail with
/// `NotReplayable`.
pub fn rewind(
    store: &ObjectStore,
    sessions: &SessionStore,
    id: &str,
) -> Result<RewindReport, RewindError> {
    let _lock = sessions.lock()?;

    // A condensed checkpoint survives only as metadata.
    if metadata::load_checkpoint(store, id)?.is_some() {
        return Err(RewindError::NotReplayable { id: id.to_string() });
    }

    let head = store.head()?;
    let worktree_id = identity::worktree_id(store)?;
    let ref_name = identity::shadow_ref_name(head, &worktree_id);
    let tip = store
        .lookup_ref(&ref_name)?
        .ok_or_else(|| RewindError::PointNotFound { id: id.to_string() })?;

    let target = store
        .resolve_commit(id)
        .map_err(|_| RewindError::PointNotFound { id: id.to_string() })?;
    let chain = store.walk(tip, Some(head))?;
    let to_base = target == head;
    if !to_base && !chain.contains(&target) {
        return Err(RewindError::PointNotFound { id: id.to_string() });
    }

    // The session owning the branch, via the tip trailer.
    let tip_info = store.commit_object(tip)?;
    let session_id = trailers::parse(&tip_info.message, trailers::ENTIRE_SESSION);
    let record = match &session_id {
        Some(eid) => sessions.load(eid)?,
        None => None,
    };

    // Refuse when the working tree carries changes the session did not
    // make: the allowed delta is the session's files-touched set.
    let head_tree = store.commit_object(head)?.tree_id;
    let current_tree = snapshot::capture(store, head_tree)?;
    let changed: BTreeSet<String> = store
        .diff_trees(head_tree, current_tree)?
        .into_iter()
        .map(|c| c.path)
        .collect();
    let mut allowed: BTreeSet<String> = store
        .diff_trees(head_tree, store.commit_object(tip)?.tree_id)?
        .into_iter()
        .map(|c| c.path)
        .collect();
    if let Some(record) = &record {
        allowed.extend(record.untracked_at_start.iter().cloned());
    }
    let dirty: Vec<String> = changed.difference(&allowed).cloned().collect();
    if !dirty.is_empty() {
        return Err(RewindError::WorkingTreeDirty { paths: dirty });
    }

    // Restore: write every differing path from the target tree, delete
    // paths that exist now but not in the target.
    let workdir = store.workdir()?;
    let current = store.flatten_tree(current_tree)?;
    let target_tree = store.commit_object(target)?.tree_id;
    let desired = store.flatten_tree(target_tree)?;

    let mut restored = 0;
    for (path, (_mode, blob)) in &desired {
        if current.get(path).map(|(_, b)| b) == Some(blob) {
            continue;
        }
        let abs = workdir.join(path);
        if let Some(parent) = abs.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&abs, store.blob_bytes(*blob)?)?;
        restored += 1;
    }

    let mut deleted = 0;
    for path in current.keys() {
        if !desired.contains_key(path) {
            let abs = workdir.join(path);
            match std::fs::remove_file(&abs) {
                Ok(()) => deleted += 1,
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(RewindError::IoError { source: e }),
            }
        }
    }

    // Truncate the shadow branch and fix up the session record.
    let (checkpoint_count, session_cleared) = if to_base {
        store.remove_ref(&ref_name)?;
        if let Some(eid) = &session_id {
            sessions.clear(eid)?;
        }
        (0, session_id.is_some())
    } else {
        store.set_ref(&ref_name, target, "entire: rewind")?;
        let count = store.walk(target, Some(head))?.len() as u32;
        if let Some(mut record) = record {
            record.checkpoint_count = count;
            record.phase = SessionPhase::Active;
            sessions.save(&record)?;
        }
        (count, false)
    };

    info!(
        event = "core.rewind.completed",
        target = %target,
        restored = restored,
        deleted = deleted,
        checkpoint_count = checkpoint_count,
    );

    Ok(RewindReport {
        restored_files: restored,
        deleted_files: deleted,
        checkpoint_count,
        session_cleared,
    })
}
