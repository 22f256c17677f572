//! Condensation: fold a session's shadow branch into one durable
//! checkpoint on the metadata branch when the user commits.
//!
//! Two phases, driven by the git hooks. `prepare` (prepare-commit-msg)
//! puts the `Entire-Checkpoint` trailer into the message file before the
//! commit object exists, restoring it on amends. `finalize` (post-commit)
//! writes the checkpoint directory onto `entire/checkpoints/v1`, retires
//! the shadow branch, and rewrites the trailer in the rare case the
//! provisional id no longer matches the real metadata.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::path::Path;

use entire_git::store::FILEMODE_BLOB;
use entire_git::ObjectStore;
use tracing::{info, warn};

use super::errors::CondenseError;
use super::metadata::{self, CheckpointInfo};
use crate::identity;
use crate::sessions::types::{SessionPhase, SessionRecord};
use crate::sessions::SessionStore;
use crate::shadow::{overlap, snapshot};
use crate::trailers;
use crate::transcripts;

/// What `prepare` did to the message file.
#[derive(Debug, PartialEq, Eq)]
pub enum PrepareOutcome {
    /// Trailer already present (amend that preserved it).
    AlreadyPresent,
    /// Amend wiped the trailer; restored from `last_checkpoint_id`.
    RestoredAmend { checkpoint_id: String },
    /// Provisional trailer attached for a normal commit.
    Attached { checkpoint_id: String },
    /// No active session with checkpoints on this HEAD.
    NoSession,
    /// The commit carries none of the session's content (user replaced
    /// it); no trailer.
    NoOverlap,
}

/// What `finalize` did after the commit.
#[derive(Debug, PartialEq, Eq)]
pub enum FinalizeOutcome {
    /// The fresh commit has no checkpoint trailer; any shadow branch left
    /// behind on the old HEAD was retired.
    NoTrailer { shadow_retired: bool },
    /// Trailer present but no matching session record; nothing to do.
    NoSession,
    Condensed {
        checkpoint_id: String,
        merged: bool,
        /// The provisional id was wrong and the commit message was
        /// rewritten in place.
        amended: bool,
    },
}

/// The session eligible for condensation against `base`: active, owns
/// checkpoints, same worktree, based on `base`. Newest wins if several.
fn condensable_session(
    sessions: &SessionStore,
    worktree_id: &str,
    base: git2::Oid,
) -> Result<Option<SessionRecord>, CondenseError> {
    let mut candidates: Vec<SessionRecord> = sessions
        .list()
        .map_err(CondenseError::from)?
        .into_iter()
        .filter(|r| {
            r.is_active()
                && r.checkpoint_count > 0
                && r.worktree_id == worktree_id
                && r.base_commit == base.to_string()
        })
        .collect();
    candidates.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(candidates.into_iter().next())
}

/// The most recently condensed session on this worktree, for amend
/// restoration.
fn last_condensed_session(
    sessions: &SessionStore,
    worktree_id: &str,
) -> Result<Option<SessionRecord>, CondenseError> {
    let mut candidates: Vec<SessionRecord> = sessions
        .list()
        .map_err(CondenseError::from)?
        .into_iter()
        .filter(|r| r.worktree_id == worktree_id && !r.last_checkpoint_id.is_empty())
        .collect();
    candidates.sort_by(|a, b| b.started_at.cmp(&a.started_at));
    Ok(candidates.into_iter().next())
}

fn read_transcript_bytes(record: &SessionRecord) -> Vec<u8> {
    match std::fs::read(&record.transcript_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!(
                event = "core.condense.transcript_read_failed",
                path = %record.transcript_path.display(),
                error = %e,
            );
            Vec::new()
        }
    }
}

/// Paths the session touched overall: base tree vs shadow tip tree.
fn shadow_diff_paths(
    store: &ObjectStore,
    base: git2::Oid,
    tip: git2::Oid,
) -> Result<BTreeSet<String>, CondenseError> {
    let base_tree = store.commit_object(base)?.tree_id;
    let tip_tree = store.commit_object(tip)?.tree_id;
    Ok(store
        .diff_trees(base_tree, tip_tree)?
        .into_iter()
        .map(|c| c.path)
        .collect())
}

/// Insert or restore the checkpoint trailer in the commit message file.
///
/// `source` is git's prepare-commit-msg source argument; `"commit"` means
/// an amend.
pub fn prepare(
    store: &ObjectStore,
    sessions: &SessionStore,
    msg_file: &Path,
    source: Option<&str>,
) -> Result<PrepareOutcome, CondenseError> {
    let message = std::fs::read_to_string(msg_file)?;
    if trailers::parse(&message, trailers::ENTIRE_CHECKPOINT).is_some() {
        return Ok(PrepareOutcome::AlreadyPresent);
    }

    let worktree_id = identity::worktree_id(store)?;

    if source == Some("commit") {
        // Amend: the old message (and its trailer) was replaced wholesale.
        let Some(record) = last_condensed_session(sessions, &worktree_id)? else {
            return Ok(PrepareOutcome::NoSession);
        };
        let updated = trailers::append(
            &message,
            trailers::ENTIRE_CHECKPOINT,
            &record.last_checkpoint_id,
        );
        std::fs::write(msg_file, updated)?;
        info!(
            event = "core.condense.amend_trailer_restored",
            checkpoint_id = %record.last_checkpoint_id,
        );
        return Ok(PrepareOutcome::RestoredAmend {
            checkpoint_id: record.last_checkpoint_id,
        });
    }

    let head = store.head()?;
    let _lock = sessions.lock()?;
    let Some(mut record) = condensable_session(sessions, &worktree_id, head)? else {
        return Ok(PrepareOutcome::NoSession);
    };

    let ref_name = identity::shadow_ref_name(head, &record.worktree_id);
    let Some(tip) = store.lookup_ref(&ref_name)? else {
        return Ok(PrepareOutcome::NoSession);
    };

    // The content about to be committed, approximated by the working
    // tree; the commit object doesn't exist yet.
    let head_tree = store.commit_object(head)?.tree_id;
    let committed_tree = snapshot::capture(store, head_tree)?;
    if !overlap::commit_has_overlap(store, tip, head, committed_tree)? {
        info!(
            event = "core.condense.no_overlap",
            session_id = %record.session_id,
        );
        return Ok(PrepareOutcome::NoOverlap);
    }

    let mut files: Vec<String> = shadow_diff_paths(store, head, tip)?.into_iter().collect();
    files.sort();
    let transcript = read_transcript_bytes(&record);
    let checkpoint_id = metadata::stable_checkpoint_id(
        &record.base_commit,
        &files,
        &metadata::transcript_hash(&transcript),
    );

    let updated = trailers::append(&message, trailers::ENTIRE_CHECKPOINT, &checkpoint_id);
    std::fs::write(msg_file, updated)?;

    record.phase = SessionPhase::ActiveCommitted;
    sessions.save(&record).map_err(CondenseError::from)?;

    info!(
        event = "core.condense.trailer_attached",
        checkpoint_id = %checkpoint_id,
        session_id = %record.session_id,
    );
    Ok(PrepareOutcome::Attached { checkpoint_id })
}

/// Condense the session behind the freshly created HEAD commit into the
/// metadata branch and retire its shadow branch.
pub fn finalize(
    store: &ObjectStore,
    sessions: &SessionStore,
) -> Result<FinalizeOutcome, CondenseError> {
    let head = store.head()?;
    let head_info = store.commit_object(head)?;
    let Some(parent) = head_info.parent_ids.first().copied() else {
        return Ok(FinalizeOutcome::NoTrailer {
            shadow_retired: false,
        });
    };

    let worktree_id = identity::worktree_id(store)?;
    let _lock = sessions.lock()?;

    let provisional = trailers::parse(&head_info.message, trailers::ENTIRE_CHECKPOINT);
    let Some(provisional) = provisional else {
        // Commit without any kept agent content: retire the stale shadow
        // branch so the orphan path never has to.
        let mut retired = false;
        if let Some(record) = condensable_session(sessions, &worktree_id, parent)? {
            let ref_name = identity::shadow_ref_name(parent, &record.worktree_id);
            if store.lookup_ref(&ref_name)?.is_some() {
                store.remove_ref(&ref_name)?;
                retired = true;
                info!(
                    event = "core.condense.shadow_retired_no_trailer",
                    session_id = %record.session_id,
                );
            }
        }
        return Ok(FinalizeOutcome::NoTrailer {
            shadow_retired: retired,
        });
    };

    let Some(mut record) = condensable_session(sessions, &worktree_id, parent)? else {
        return Ok(FinalizeOutcome::NoSession);
    };

    let ref_name = identity::shadow_ref_name(parent, &record.worktree_id);
    let Some(tip) = store.lookup_ref(&ref_name)? else {
        return Ok(FinalizeOutcome::NoSession);
    };

    // files_touched: the user's commit diff united with the shadow diff.
    let parent_tree = store.commit_object(parent)?.tree_id;
    let mut files: BTreeSet<String> = store
        .diff_trees(parent_tree, head_info.tree_id)?
        .into_iter()
        .map(|c| c.path)
        .collect();
    files.extend(shadow_diff_paths(store, parent, tip)?);
    let files: Vec<String> = files.into_iter().collect();

    let transcript = read_transcript_bytes(&record);
    let checkpoint_id = metadata::stable_checkpoint_id(
        &record.base_commit,
        &files,
        &metadata::transcript_hash(&transcript),
    );

    // The one permitted mutation of user history: fix the trailer when
    // the provisional id missed.
    let amended = if provisional != checkpoint_id {
        let updated = trailers::append(
            &head_info.message,
            trailers::ENTIRE_CHECKPOINT,
            &checkpoint_id,
        );
        store.amend_head_message(&updated)?;
        warn!(
            event = "core.condense.trailer_rewritten",
            provisional = %provisional,
            final_id = %checkpoint_id,
        );
        true
    } else {
        false
    };

    let merged = write_checkpoint(store, &record, &checkpoint_id, &files, &transcript)?;

    store.remove_ref(&ref_name)?;
    record.phase = SessionPhase::Condensed;
    record.last_checkpoint_id = checkpoint_id.clone();
    sessions.save(&record).map_err(CondenseError::from)?;

    info!(
        event = "core.condense.completed",
        checkpoint_id = %checkpoint_id,
        session_id = %record.session_id,
        merged = merged,
    );
    Ok(FinalizeOutcome::Condensed {
        checkpoint_id,
        merged,
        amended,
    })
}

/// Write (or merge into) the checkpoint directory on the metadata branch.
/// Returns whether an existing checkpoint at the same id was merged.
fn write_checkpoint(
    store: &ObjectStore,
    record: &SessionRecord,
    checkpoint_id: &str,
    files_touched: &[String],
    transcript: &[u8],
) -> Result<bool, CondenseError> {
    let meta_tip = store.lookup_ref(identity::METADATA_REF)?;
    let dir = identity::checkpoint_id_path(checkpoint_id);

    let mut upserts: BTreeMap<String, (i32, git2::Oid)> = BTreeMap::new();
    let mut deletes: Vec<String> = Vec::new();
    let mut session_ids = vec![record.session_id.clone()];
    let mut merged = false;

    if let Some(tip) = meta_tip {
        let tree = store.commit_object(tip)?.tree_id;
        let flat = store.flatten_tree(tree)?;
        let root_prefix = format!("{}/", dir);

        // Existing root-level files of this checkpoint move into the next
        // free numbered archive folder.
        let root_files: Vec<(String, (i32, git2::Oid))> = flat
            .iter()
            .filter(|(path, _)| {
                path.starts_with(&root_prefix)
                    && !path[root_prefix.len()..].contains('/')
            })
            .map(|(path, entry)| (path.clone(), *entry))
            .collect();

        if !root_files.is_empty() {
            merged = true;
            let next_archive = (1..)
                .find(|n| {
                    !flat
                        .keys()
                        .any(|p| p.starts_with(&format!("{}{}/", root_prefix, n)))
                })
                .unwrap_or(1);

            for (path, (mode, blob)) in &root_files {
                let name = &path[root_prefix.len()..];
                if name == "metadata.json" {
                    match serde_json::from_slice::<CheckpointInfo>(&store.blob_bytes(*blob)?) {
                        Ok(existing) => {
                            session_ids.extend(
                                existing.all_session_ids().iter().map(|s| s.to_string()),
                            );
                        }
                        Err(e) => {
                            warn!(
                                event = "core.condense.merge_metadata_corrupt",
                                path = %path,
                                error = %e,
                            );
                        }
                    }
                }
                upserts.insert(
                    format!("{}{}/{}", root_prefix, next_archive, name),
                    (*mode, *blob),
                );
                deletes.push(path.clone());
            }
        }
    }

    let adapter = transcripts::adapter_for(record.agent_type);
    let extension = adapter.map(|a| a.transcript_extension()).unwrap_or("txt");

    let info = CheckpointInfo {
        checkpoint_id: checkpoint_id.to_string(),
        session_id: if session_ids.len() == 1 {
            Some(record.session_id.clone())
        } else {
            None
        },
        session_ids: if session_ids.len() > 1 {
            session_ids.clone()
        } else {
            Vec::new()
        },
        strategy: identity::STRATEGY_MANUAL_COMMIT.to_string(),
        files_touched: files_touched.to_vec(),
        created_at: chrono::Utc::now().to_rfc3339(),
        base_commit: record.base_commit.clone(),
        is_task: false,
        tool_use_id: String::new(),
        is_logs_only: true,
    };
    let meta_json =
        serde_json::to_vec_pretty(&info).map_err(|e| CondenseError::MetadataCorruption {
            path: format!("{}/metadata.json", dir),
            message: e.to_string(),
        })?;
    upserts.insert(
        format!("{}/metadata.json", dir),
        (FILEMODE_BLOB, store.blob_from_bytes(&meta_json)?),
    );

    if let Some(adapter) = adapter
        && let Ok(entries) = adapter.parse(transcript)
        && let Some(prompt) = adapter.first_user_prompt(&entries)
    {
        upserts.insert(
            format!("{}/prompt.txt", dir),
            (FILEMODE_BLOB, store.blob_from_bytes(prompt.as_bytes())?),
        );
    }
    upserts.insert(
        format!("{}/transcript.{}", dir, extension),
        (FILEMODE_BLOB, store.blob_from_bytes(transcript)?),
    );

    let new_tree = match meta_tip {
        Some(tip) => {
            let base_tree = store.commit_object(tip)?.tree_id;
            store.update_tree(base_tree, &upserts, &deletes)?
        }
        None => store.build_tree(&upserts)?,
    };

    let message = format!(
        "Condense {}\n\nEntire-Session: {}\n",
        checkpoint_id, record.session_id
    );
    let parents: Vec<git2::Oid> = meta_tip.into_iter().collect();
    let commit = store.make_commit(new_tree, &parents, &message)?;
    store.set_ref(
        identity::METADATA_REF,
        commit,
        &format!("entire: condense {}", checkpoint_id),
    )?;

    Ok(merged)
}
