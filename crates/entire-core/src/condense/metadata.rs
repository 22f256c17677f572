//! Checkpoint metadata: the `metadata.json` schema on the metadata branch
//! and the stable checkpoint id derivation.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::identity;
use entire_git::{GitError, ObjectStore};

/// Contents of `<XX>/<YYYYYYYYYY>/metadata.json`.
///
/// Single-session checkpoints fill `session_id`; multi-session merges move
/// the ids into `session_ids` (newest first) and clear `session_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckpointInfo {
    pub checkpoint_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub session_ids: Vec<String>,

    pub strategy: String,

    pub files_touched: Vec<String>,

    pub created_at: String,

    pub base_commit: String,

    #[serde(default)]
    pub is_task: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tool_use_id: String,

    #[serde(default)]
    pub is_logs_only: bool,
}

impl CheckpointInfo {
    /// All session ids, regardless of single/multi representation.
    pub fn all_session_ids(&self) -> Vec<&str> {
        if self.session_ids.is_empty() {
            self.session_id.iter().map(String::as_str).collect()
        } else {
            self.session_ids.iter().map(String::as_str).collect()
        }
    }
}

/// Full SHA-256 hex of a transcript's bytes.
pub fn transcript_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Stable 12-hex checkpoint id: a SHA-256 over the canonical encoding of
/// (base commit, ordered files touched, transcript hash). Identical inputs
/// yield identical ids across machines.
pub fn stable_checkpoint_id(
    base_commit: &str,
    files_touched: &[String],
    transcript_hash: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(base_commit.as_bytes());
    hasher.update(b"\0");
    for file in files_touched {
        hasher.update(file.as_bytes());
        hasher.update(b"\0");
    }
    hasher.update(transcript_hash.as_bytes());
    hex::encode(&hasher.finalize()[..6])
}

/// True for a well-formed 12-hex checkpoint id.
pub fn is_checkpoint_id(s: &str) -> bool {
    s.len() == 12 && s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
}

/// Load a checkpoint's metadata (and prompt, when present) from the
/// metadata branch. `Ok(None)` when the branch or the checkpoint does not
/// exist, or when the id is not even id-shaped.
pub fn load_checkpoint(
    store: &ObjectStore,
    checkpoint_id: &str,
) -> Result<Option<(CheckpointInfo, Option<String>)>, GitError> {
    if !is_checkpoint_id(checkpoint_id) {
        return Ok(None);
    }
    let Some(tip) = store.lookup_ref(identity::METADATA_REF)? else {
        return Ok(None);
    };
    let tree = store.commit_object(tip)?.tree_id;
    let dir = identity::checkpoint_id_path(checkpoint_id);

    let Some(meta_blob) = store.tree_blob_at(tree, &format!("{}/metadata.json", dir))? else {
        return Ok(None);
    };
    let bytes = store.blob_bytes(meta_blob)?;
    let info: CheckpointInfo =
        serde_json::from_slice(&bytes).map_err(|e| GitError::OperationFailed {
            message: format!("corrupt metadata for checkpoint {}: {}", checkpoint_id, e),
        })?;

    let prompt = match store.tree_blob_at(tree, &format!("{}/prompt.txt", dir))? {
        Some(blob) => Some(String::from_utf8_lossy(&store.blob_bytes(blob)?).into_owned()),
        None => None,
    };
    Ok(Some((info, prompt)))
}

/// Every checkpoint recorded on the metadata branch, in tree order.
/// Callers sort by `created_at` when recency matters.
pub fn list_checkpoints(store: &ObjectStore) -> Result<Vec<CheckpointInfo>, GitError> {
    let Some(tip) = store.lookup_ref(identity::METADATA_REF)? else {
        return Ok(Vec::new());
    };
    let tree = store.commit_object(tip)?.tree_id;
    let mut out = Vec::new();
    for (path, (_mode, blob)) in store.flatten_tree(tree)? {
        // Root metadata only; archived copies live under numbered subdirs.
        let segments: Vec<&str> = path.split('/').collect();
        if segments.len() == 3 && segments[2] == "metadata.json" {
            let bytes = store.blob_bytes(blob)?;
            match serde_json::from_slice::<CheckpointInfo>(&bytes) {
                Ok(info) => out.push(info),
                Err(e) => {
                    tracing::warn!(
                        event = "core.condense.metadata_skip_corrupt",
                        path = %path,
                        error = %e,
                    );
                }
            }
        }
    }
    Ok(out)
}
