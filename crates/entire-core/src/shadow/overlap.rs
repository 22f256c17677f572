//! Content-aware overlap detection.
//!
//! Distinguishes agent work the user kept from agent work the user
//! replaced. A path is *new* when absent from the session's base commit,
//! *modified* otherwise. Modified paths always count as overlap; new paths
//! only count when their current content matches a blob this session
//! previously wrote for the same path.

use entire_git::{ChangeKind, ObjectStore, TreeChange};

use super::errors::ShadowError;

/// How a touched path relates to the session's base commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TouchKind {
    /// Absent in the base commit.
    New,
    /// Present in the base commit (includes deletions of tracked files).
    Modified,
}

#[derive(Debug, Clone)]
pub struct TouchedPath {
    pub path: String,
    pub kind: TouchKind,
    /// Content blob in the tree under inspection; `None` for deletions.
    pub blob: Option<git2::Oid>,
}

/// Classify tree changes against the session's base tree, pairing each
/// path with its current blob from `current_tree`.
pub fn classify_changes(
    store: &ObjectStore,
    base_tree: git2::Oid,
    current_tree: git2::Oid,
    changes: &[TreeChange],
) -> Result<Vec<TouchedPath>, ShadowError> {
    let mut touched = Vec::with_capacity(changes.len());
    for change in changes {
        let kind = if store.tree_blob_at(base_tree, &change.path)?.is_some() {
            TouchKind::Modified
        } else {
            TouchKind::New
        };
        let blob = match change.kind {
            ChangeKind::Deleted => None,
            _ => store.tree_blob_at(current_tree, &change.path)?,
        };
        touched.push(TouchedPath {
            path: change.path.clone(),
            kind,
            blob,
        });
    }
    Ok(touched)
}

/// Blob ids this session wrote for `path`, one per shadow commit whose
/// tree contains it.
fn session_blobs_for_path(
    store: &ObjectStore,
    shadow_tip: git2::Oid,
    base_commit: git2::Oid,
    path: &str,
) -> Result<Vec<git2::Oid>, ShadowError> {
    let mut blobs = Vec::new();
    for commit in store.walk(shadow_tip, Some(base_commit))? {
        let tree = store.commit_object(commit)?.tree_id;
        if let Some(blob) = store.tree_blob_at(tree, path)? {
            blobs.push(blob);
        }
    }
    Ok(blobs)
}

/// True when the touched set carries none of the session's content: every
/// path is new and none of the current blobs matches a blob the session
/// previously wrote for that path. Modified paths defeat this immediately.
pub fn is_replaced_content(
    store: &ObjectStore,
    shadow_tip: git2::Oid,
    base_commit: git2::Oid,
    touched: &[TouchedPath],
) -> Result<bool, ShadowError> {
    for t in touched {
        if t.kind == TouchKind::Modified {
            return Ok(false);
        }
    }
    for t in touched {
        if let Some(blob) = t.blob
            && session_blobs_for_path(store, shadow_tip, base_commit, &t.path)?.contains(&blob)
        {
            return Ok(false);
        }
    }
    Ok(true)
}

/// Overlap decision for condensation: does the working state the user is
/// committing still contain this session's contribution?
///
/// Touched paths are the session's overall shadow diff; `current_tree` is
/// what the user is about to commit.
pub fn commit_has_overlap(
    store: &ObjectStore,
    shadow_tip: git2::Oid,
    base_commit: git2::Oid,
    current_tree: git2::Oid,
) -> Result<bool, ShadowError> {
    let base_tree = store.commit_object(base_commit)?.tree_id;
    let shadow_tree = store.commit_object(shadow_tip)?.tree_id;
    let changes = store.diff_trees(base_tree, shadow_tree)?;
    if changes.is_empty() {
        return Ok(false);
    }
    let touched = classify_changes(store, base_tree, current_tree, &changes)?;
    Ok(!is_replaced_content(store, shadow_tip, base_commit, &touched)?)
}
