//! Working tree capture.
//!
//! A snapshot is the HEAD tree overlaid with every status delta of the
//! working tree: staged and unstaged edits, untracked files (gitignore
//! honored), and deletions. Unchanged files reuse the HEAD tree's blobs,
//! so capture cost scales with the change set, not the repository.

use std::collections::BTreeMap;
use std::path::Path;

use entire_git::{ObjectStore, store::FILEMODE_BLOB};
use git2::{Status, StatusOptions, StatusShow};
use tracing::debug;

use super::errors::ShadowError;

const FILEMODE_BLOB_EXECUTABLE: i32 = 0o100755;

fn status_options() -> StatusOptions {
    let mut opts = StatusOptions::new();
    opts.show(StatusShow::IndexAndWorkdir)
        .include_untracked(true)
        .recurse_untracked_dirs(true)
        .include_ignored(false)
        .exclude_submodules(true);
    opts
}

const CHANGED: Status = Status::WT_NEW
    .union(Status::WT_MODIFIED)
    .union(Status::WT_RENAMED)
    .union(Status::WT_TYPECHANGE)
    .union(Status::INDEX_NEW)
    .union(Status::INDEX_MODIFIED)
    .union(Status::INDEX_RENAMED)
    .union(Status::INDEX_TYPECHANGE);

const DELETED: Status = Status::WT_DELETED.union(Status::INDEX_DELETED);

/// Capture the current working tree as a tree object rooted at the HEAD
/// tree. Returns the new tree id.
pub fn capture(store: &ObjectStore, head_tree: git2::Oid) -> Result<git2::Oid, ShadowError> {
    let workdir = store.workdir()?;
    let statuses = store
        .repo()
        .statuses(Some(&mut status_options()))
        .map_err(entire_git::GitError::from)?;

    let mut upserts: BTreeMap<String, (i32, git2::Oid)> = BTreeMap::new();
    let mut deletes: Vec<String> = Vec::new();

    for entry in statuses.iter() {
        let Some(rel_path) = entry.path() else {
            continue;
        };
        let status = entry.status();

        if status.intersects(DELETED) && !workdir.join(rel_path).exists() {
            deletes.push(rel_path.to_string());
            continue;
        }
        if !status.intersects(CHANGED) {
            continue;
        }

        let abs = workdir.join(rel_path);
        let bytes = match std::fs::read(&abs) {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                deletes.push(rel_path.to_string());
                continue;
            }
            Err(e) => return Err(ShadowError::IoError { source: e }),
        };
        let blob = store.blob_from_bytes(&bytes)?;
        upserts.insert(rel_path.to_string(), (file_mode(&abs), blob));
    }

    debug!(
        event = "core.shadow.snapshot_captured",
        upserts = upserts.len(),
        deletes = deletes.len(),
    );
    Ok(store.update_tree(head_tree, &upserts, &deletes)?)
}

/// Paths present in the worktree but not tracked by HEAD, recorded at
/// session start so rewind can preserve them.
pub fn untracked_paths(store: &ObjectStore) -> Result<Vec<String>, ShadowError> {
    let statuses = store
        .repo()
        .statuses(Some(&mut status_options()))
        .map_err(entire_git::GitError::from)?;
    let mut paths = Vec::new();
    for entry in statuses.iter() {
        if entry.status().contains(Status::WT_NEW)
            && let Some(path) = entry.path()
        {
            paths.push(path.to_string());
        }
    }
    paths.sort();
    Ok(paths)
}

#[cfg(unix)]
fn file_mode(path: &Path) -> i32 {
    use std::os::unix::fs::PermissionsExt;
    match std::fs::metadata(path) {
        Ok(meta) if meta.permissions().mode() & 0o111 != 0 => FILEMODE_BLOB_EXECUTABLE,
        _ => FILEMODE_BLOB,
    }
}

#[cfg(not(unix))]
fn file_mode(_path: &Path) -> i32 {
    FILEMODE_BLOB
}

#[cfg(test)]
mod tests {
    use super::*;
    use entire_git::test_support;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        test_support::init_repo_with_commit(dir.path()).unwrap();
        test_support::commit_file(dir.path(), "README.md", "# repo\n", "Add readme").unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    fn head_tree(store: &ObjectStore) -> git2::Oid {
        let head = store.head().unwrap();
        store.commit_object(head).unwrap().tree_id
    }

    #[test]
    fn test_capture_clean_tree_equals_head() {
        let (_dir, store) = fixture();
        let tree = capture(&store, head_tree(&store)).unwrap();
        assert_eq!(tree, head_tree(&store));
    }

    #[test]
    fn test_capture_includes_untracked_file() {
        let (dir, store) = fixture();
        std::fs::write(dir.path().join("hello.go"), "package main\n").unwrap();

        let tree = capture(&store, head_tree(&store)).unwrap();
        let flat = store.flatten_tree(tree).unwrap();
        assert!(flat.contains_key("hello.go"));
        assert!(flat.contains_key("README.md"));
    }

    #[test]
    fn test_capture_includes_modification_and_deletion() {
        let (dir, store) = fixture();
        test_support::commit_file(dir.path(), "gone.txt", "bye", "Add gone").unwrap();

        std::fs::write(dir.path().join("README.md"), "# changed\n").unwrap();
        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();

        let tree = capture(&store, head_tree(&store)).unwrap();
        let flat = store.flatten_tree(tree).unwrap();
        assert!(!flat.contains_key("gone.txt"));

        let readme_blob = flat["README.md"].1;
        assert_eq!(store.blob_bytes(readme_blob).unwrap(), b"# changed\n");
    }

    #[test]
    fn test_capture_respects_gitignore() {
        let (dir, store) = fixture();
        test_support::commit_file(dir.path(), ".gitignore", "target/\n", "Ignore target").unwrap();
        std::fs::create_dir_all(dir.path().join("target")).unwrap();
        std::fs::write(dir.path().join("target/out.bin"), "junk").unwrap();
        std::fs::write(dir.path().join("kept.txt"), "keep").unwrap();

        let tree = capture(&store, head_tree(&store)).unwrap();
        let flat = store.flatten_tree(tree).unwrap();
        assert!(!flat.contains_key("target/out.bin"));
        assert!(flat.contains_key("kept.txt"));
    }

    #[test]
    fn test_untracked_paths_at_start() {
        let (dir, store) = fixture();
        std::fs::write(dir.path().join("notes.txt"), "scratch").unwrap();
        std::fs::create_dir_all(dir.path().join("drafts")).unwrap();
        std::fs::write(dir.path().join("drafts/a.md"), "draft").unwrap();

        let paths = untracked_paths(&store).unwrap();
        assert_eq!(paths, vec!["drafts/a.md".to_string(), "notes.txt".to_string()]);
    }
}
