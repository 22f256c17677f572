//! Identity and naming: worktree fingerprints, shadow branch names,
//! checkpoint id paths, and date-prefixed session ids.

use std::path::Path;

use chrono::Utc;
use entire_git::{GitError, ObjectStore};
use sha2::{Digest, Sha256};

/// Branch holding condensed checkpoint metadata, shared by every worktree.
pub const METADATA_BRANCH: &str = "entire/checkpoints/v1";

/// Fully qualified ref of the metadata branch.
pub const METADATA_REF: &str = "refs/heads/entire/checkpoints/v1";

/// Directory under `.git` holding session record files.
pub const SESSIONS_DIR: &str = "entire-sessions";

/// Strategy trailer value for shadow checkpoints.
pub const STRATEGY_MANUAL_COMMIT: &str = "manual-commit";

/// Short, stable fingerprint of a worktree: 8 hex of a SHA-256 over the
/// repository identity (shared git dir) and the worktree's absolute path.
/// Pure so it hashes identically across processes and machines sharing a
/// filesystem layout.
pub fn fingerprint(common_dir: &Path, worktree_path: &Path) -> String {
    let mut hasher = Sha256::new();
    hasher.update(common_dir.to_string_lossy().as_bytes());
    hasher.update(b"\0");
    hasher.update(worktree_path.to_string_lossy().as_bytes());
    hex::encode(&hasher.finalize()[..4])
}

/// Worktree fingerprint for branch naming. The main worktree maps to the
/// empty string so its shadow branches keep the historical un-suffixed
/// names.
pub fn worktree_id(store: &ObjectStore) -> Result<String, GitError> {
    if !store.is_linked_worktree() {
        return Ok(String::new());
    }
    Ok(fingerprint(&store.common_dir(), &store.workdir()?))
}

/// Shadow branch short name for a base commit + worktree fingerprint:
/// `entire/<short7>` or `entire/<short7>-<W>`.
pub fn shadow_branch_name(base_commit: git2::Oid, worktree_id: &str) -> String {
    let short = &base_commit.to_string()[..7];
    if worktree_id.is_empty() {
        format!("entire/{}", short)
    } else {
        format!("entire/{}-{}", short, worktree_id)
    }
}

/// Fully qualified shadow branch ref.
pub fn shadow_ref_name(base_commit: git2::Oid, worktree_id: &str) -> String {
    format!("refs/heads/{}", shadow_branch_name(base_commit, worktree_id))
}

/// Directory path of a checkpoint on the metadata branch:
/// `abcdef012345` -> `ab/cdef012345`.
pub fn checkpoint_id_path(cid: &str) -> String {
    format!("{}/{}", &cid[..2], &cid[2..])
}

/// Prefix a raw agent session id with today's UTC date, yielding the
/// identity exposed in trailers and metadata.
pub fn entire_session_id(raw: &str) -> String {
    format!("{}-{}", Utc::now().format("%Y-%m-%d"), raw)
}

/// Strip the `YYYY-MM-DD-` prefix from an exposed session id, recovering
/// the agent's raw id. Ids without the prefix pass through unchanged.
pub fn extract_agent_session_id(eid: &str) -> &str {
    if has_date_prefix(eid) { &eid[11..] } else { eid }
}

fn has_date_prefix(s: &str) -> bool {
    let b = s.as_bytes();
    if b.len() < 11 {
        return false;
    }
    b[..4].iter().all(u8::is_ascii_digit)
        && b[4] == b'-'
        && b[5].is_ascii_digit()
        && b[6].is_ascii_digit()
        && b[7] == b'-'
        && b[8].is_ascii_digit()
        && b[9].is_ascii_digit()
        && b[10] == b'-'
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_fingerprint_is_stable_and_distinct() {
        let common = PathBuf::from("/repo/.git");
        let main = PathBuf::from("/repo");
        let linked = PathBuf::from("/worktrees/feature");

        let a = fingerprint(&common, &main);
        let b = fingerprint(&common, &main);
        let c = fingerprint(&common, &linked);

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert_eq!(a.len(), 8);
        assert!(a.chars().all(|ch| ch.is_ascii_hexdigit()));
    }

    #[test]
    fn test_shadow_branch_name_main_worktree() {
        let oid = git2::Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(shadow_branch_name(oid, ""), "entire/0123456");
        assert_eq!(
            shadow_ref_name(oid, ""),
            "refs/heads/entire/0123456"
        );
    }

    #[test]
    fn test_shadow_branch_name_linked_worktree() {
        let oid = git2::Oid::from_str("0123456789abcdef0123456789abcdef01234567").unwrap();
        assert_eq!(shadow_branch_name(oid, "a1b2c3d4"), "entire/0123456-a1b2c3d4");
    }

    #[test]
    fn test_checkpoint_id_path() {
        assert_eq!(checkpoint_id_path("abcdef012345"), "ab/cdef012345");
    }

    #[test]
    fn test_entire_session_id_round_trip() {
        let eid = entire_session_id("sess-42");
        assert_eq!(eid.len(), 11 + "sess-42".len());
        assert_eq!(extract_agent_session_id(&eid), "sess-42");
    }

    #[test]
    fn test_extract_without_prefix_passes_through() {
        assert_eq!(extract_agent_session_id("sess-42"), "sess-42");
        assert_eq!(extract_agent_session_id("2024-1x-01-s"), "2024-1x-01-s");
        assert_eq!(extract_agent_session_id(""), "");
    }

    #[test]
    fn test_date_prefix_detection() {
        assert!(has_date_prefix("2026-08-01-x"));
        assert!(!has_date_prefix("2026-08-01"));
        assert!(!has_date_prefix("202a-08-01-x"));
    }
}
