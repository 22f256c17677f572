//! Object store operations over git2.
//!
//! All tree construction goes through in-memory `TreeBuilder`s so the
//! user's index is never read or written. Refs are updated atomically by
//! libgit2; callers own any retry policy.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use git2::{ObjectType, Repository, Signature, TreeWalkMode};
use tracing::debug;

use crate::errors::GitError;

/// Regular file mode for tree entries.
pub const FILEMODE_BLOB: i32 = 0o100644;

/// How a path changed between two trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChangeKind {
    Added,
    Modified,
    Deleted,
}

/// One changed path from a tree-to-tree diff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeChange {
    pub path: String,
    pub kind: ChangeKind,
}

/// Snapshot of a commit's interesting fields.
#[derive(Debug, Clone)]
pub struct CommitInfo {
    pub id: git2::Oid,
    pub tree_id: git2::Oid,
    pub parent_ids: Vec<git2::Oid>,
    pub message: String,
    pub seconds: i64,
}

/// Handle on a repository's object database and refs.
pub struct ObjectStore {
    repo: Repository,
}

impl ObjectStore {
    /// Open the repository containing `path` (any directory inside a
    /// worktree). Fails with `RepositoryNotFound` when no repository is
    /// found walking up from `path`.
    pub fn open(path: &Path) -> Result<Self, GitError> {
        let repo = Repository::discover(path).map_err(|_| GitError::RepositoryNotFound {
            path: path.display().to_string(),
        })?;
        Ok(Self { repo })
    }

    /// Access the underlying git2 repository for status queries.
    pub fn repo(&self) -> &Repository {
        &self.repo
    }

    /// Absolute path of the working directory. Bare repositories are not
    /// usable as checkpoint targets.
    pub fn workdir(&self) -> Result<PathBuf, GitError> {
        self.repo
            .workdir()
            .map(Path::to_path_buf)
            .ok_or_else(|| GitError::NotAWorktree {
                path: self.repo.path().display().to_string(),
            })
    }

    /// The `.git` directory of this worktree (per-worktree gitdir for
    /// linked worktrees).
    pub fn git_dir(&self) -> PathBuf {
        self.repo.path().to_path_buf()
    }

    /// The shared git directory, identical across linked worktrees.
    pub fn common_dir(&self) -> PathBuf {
        self.repo.commondir().to_path_buf()
    }

    /// True when this is a linked worktree rather than the main one.
    pub fn is_linked_worktree(&self) -> bool {
        self.repo.is_worktree()
    }

    /// Commit id HEAD points at. `UnbornHead` on a repository with no
    /// commits yet.
    pub fn head(&self) -> Result<git2::Oid, GitError> {
        let head = self.repo.head().map_err(|e| {
            if e.code() == git2::ErrorCode::UnbornBranch || e.code() == git2::ErrorCode::NotFound {
                GitError::UnbornHead
            } else {
                GitError::Git2Error { source: e }
            }
        })?;
        head.peel_to_commit()
            .map(|c| c.id())
            .map_err(|e| GitError::Git2Error { source: e })
    }

    /// Look up a fully qualified ref (`refs/heads/...`). `Ok(None)` when
    /// the ref does not exist.
    pub fn lookup_ref(&self, name: &str) -> Result<Option<git2::Oid>, GitError> {
        match self.repo.find_reference(name) {
            Ok(r) => Ok(r.target()),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2Error { source: e }),
        }
    }

    /// Create or move a ref to `target`.
    pub fn set_ref(&self, name: &str, target: git2::Oid, log_message: &str) -> Result<(), GitError> {
        self.repo.reference(name, target, true, log_message)?;
        debug!(event = "git.ref_updated", name = name, target = %target);
        Ok(())
    }

    /// Delete a ref. `RefNotFound` when it does not exist.
    pub fn remove_ref(&self, name: &str) -> Result<(), GitError> {
        let mut reference = match self.repo.find_reference(name) {
            Ok(r) => r,
            Err(e) if e.code() == git2::ErrorCode::NotFound => {
                return Err(GitError::RefNotFound {
                    name: name.to_string(),
                });
            }
            Err(e) => return Err(GitError::Git2Error { source: e }),
        };
        reference.delete()?;
        debug!(event = "git.ref_deleted", name = name);
        Ok(())
    }

    /// Fully qualified refs matching a glob (e.g. `refs/heads/entire/*`)
    /// with their targets.
    pub fn list_refs(&self, glob: &str) -> Result<Vec<(String, git2::Oid)>, GitError> {
        let mut out = Vec::new();
        for reference in self.repo.references_glob(glob)? {
            let reference = reference?;
            if let (Some(name), Some(target)) = (reference.name(), reference.target()) {
                out.push((name.to_string(), target));
            }
        }
        Ok(out)
    }

    /// Commit ids from `start` (inclusive) down to `until` (exclusive),
    /// newest first. With `until = None` the walk runs to the root.
    pub fn walk(
        &self,
        start: git2::Oid,
        until: Option<git2::Oid>,
    ) -> Result<Vec<git2::Oid>, GitError> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.push(start)?;
        if let Some(stop) = until {
            revwalk.hide(stop)?;
        }
        let mut out = Vec::new();
        for oid in revwalk {
            out.push(oid?);
        }
        Ok(out)
    }

    /// Write bytes as a blob.
    pub fn blob_from_bytes(&self, bytes: &[u8]) -> Result<git2::Oid, GitError> {
        Ok(self.repo.blob(bytes)?)
    }

    /// Read a blob's content.
    pub fn blob_bytes(&self, oid: git2::Oid) -> Result<Vec<u8>, GitError> {
        let blob = self
            .repo
            .find_blob(oid)
            .map_err(|_| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })?;
        Ok(blob.content().to_vec())
    }

    /// Build a tree from fully qualified `path -> (mode, blob)` entries,
    /// materializing every intermediate directory. Paths use `/`
    /// separators relative to the repository root.
    pub fn build_tree(
        &self,
        entries: &BTreeMap<String, (i32, git2::Oid)>,
    ) -> Result<git2::Oid, GitError> {
        let mut root = DirNode::default();
        for (path, (mode, oid)) in entries {
            root.insert(path, *mode, *oid);
        }
        self.write_dir(&root)
    }

    /// Overlay `upserts` and `deletes` onto an existing tree and build the
    /// result. Unchanged entries reuse the base tree's blobs.
    pub fn update_tree(
        &self,
        base: git2::Oid,
        upserts: &BTreeMap<String, (i32, git2::Oid)>,
        deletes: &[String],
    ) -> Result<git2::Oid, GitError> {
        let mut entries = self.flatten_tree(base)?;
        for path in deletes {
            entries.remove(path);
        }
        for (path, entry) in upserts {
            entries.insert(path.clone(), *entry);
        }
        self.build_tree(&entries)
    }

    /// Flatten a tree into `path -> (mode, blob)` entries.
    pub fn flatten_tree(
        &self,
        tree_id: git2::Oid,
    ) -> Result<BTreeMap<String, (i32, git2::Oid)>, GitError> {
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|_| GitError::ObjectNotFound {
                oid: tree_id.to_string(),
            })?;
        let mut out = BTreeMap::new();
        tree.walk(TreeWalkMode::PreOrder, |root, entry| {
            if entry.kind() == Some(ObjectType::Blob)
                && let Some(name) = entry.name()
            {
                out.insert(format!("{}{}", root, name), (entry.filemode(), entry.id()));
            }
            git2::TreeWalkResult::Ok
        })?;
        Ok(out)
    }

    /// Blob id for a single path in a tree, `None` when absent.
    pub fn tree_blob_at(
        &self,
        tree_id: git2::Oid,
        path: &str,
    ) -> Result<Option<git2::Oid>, GitError> {
        let tree = self
            .repo
            .find_tree(tree_id)
            .map_err(|_| GitError::ObjectNotFound {
                oid: tree_id.to_string(),
            })?;
        match tree.get_path(Path::new(path)) {
            Ok(entry) if entry.kind() == Some(ObjectType::Blob) => Ok(Some(entry.id())),
            Ok(_) => Ok(None),
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(GitError::Git2Error { source: e }),
        }
    }

    /// Changed paths between two trees.
    pub fn diff_trees(
        &self,
        old: git2::Oid,
        new: git2::Oid,
    ) -> Result<Vec<TreeChange>, GitError> {
        let old_tree = self.repo.find_tree(old)?;
        let new_tree = self.repo.find_tree(new)?;
        let diff = self
            .repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)?;
        let mut changes = Vec::new();
        for delta in diff.deltas() {
            let kind = match delta.status() {
                git2::Delta::Added => ChangeKind::Added,
                git2::Delta::Deleted => ChangeKind::Deleted,
                _ => ChangeKind::Modified,
            };
            let path = delta
                .new_file()
                .path()
                .or_else(|| delta.old_file().path())
                .map(|p| p.to_string_lossy().into_owned());
            if let Some(path) = path {
                changes.push(TreeChange { path, kind });
            }
        }
        Ok(changes)
    }

    /// Committer/author identity for engine-made commits. Falls back to a
    /// fixed identity when the repository has no configured user.
    pub fn signature(&self) -> Result<Signature<'static>, GitError> {
        match self.repo.signature() {
            Ok(sig) => Ok(sig),
            Err(_) => Ok(Signature::now("entire", "entire@localhost")?),
        }
    }

    /// Create a commit object without moving any ref. Callers update refs
    /// explicitly via `set_ref`.
    pub fn make_commit(
        &self,
        tree_id: git2::Oid,
        parents: &[git2::Oid],
        message: &str,
    ) -> Result<git2::Oid, GitError> {
        let tree = self.repo.find_tree(tree_id)?;
        let sig = self.signature()?;
        let parent_commits = parents
            .iter()
            .map(|oid| self.repo.find_commit(*oid))
            .collect::<Result<Vec<_>, _>>()?;
        let parent_refs: Vec<&git2::Commit> = parent_commits.iter().collect();
        let oid = self
            .repo
            .commit(None, &sig, &sig, message, &tree, &parent_refs)?;
        Ok(oid)
    }

    /// Load a commit's fields.
    pub fn commit_object(&self, oid: git2::Oid) -> Result<CommitInfo, GitError> {
        let commit = self
            .repo
            .find_commit(oid)
            .map_err(|_| GitError::ObjectNotFound {
                oid: oid.to_string(),
            })?;
        Ok(CommitInfo {
            id: commit.id(),
            tree_id: commit.tree_id(),
            parent_ids: commit.parent_ids().collect(),
            message: commit.message().unwrap_or_default().to_string(),
            seconds: commit.time().seconds(),
        })
    }

    /// True when `oid` resolves to a commit in the object database.
    pub fn commit_exists(&self, oid: git2::Oid) -> bool {
        self.repo.find_commit(oid).is_ok()
    }

    /// Resolve a revision spec (full or abbreviated commit id) to a commit.
    pub fn resolve_commit(&self, spec: &str) -> Result<git2::Oid, GitError> {
        let obj = self
            .repo
            .revparse_single(spec)
            .map_err(|_| GitError::ObjectNotFound {
                oid: spec.to_string(),
            })?;
        obj.peel_to_commit()
            .map(|c| c.id())
            .map_err(|_| GitError::ObjectNotFound {
                oid: spec.to_string(),
            })
    }

    /// Rewrite HEAD's commit message in place. Only used by condensation
    /// when the provisional checkpoint id turned out wrong; equivalent to
    /// the `git commit --amend` the user would run by hand.
    pub fn amend_head_message(&self, message: &str) -> Result<git2::Oid, GitError> {
        let head = self.head()?;
        let commit = self.repo.find_commit(head)?;
        let oid = commit.amend(Some("HEAD"), None, None, None, Some(message), None)?;
        debug!(event = "git.head_amended", old = %head, new = %oid);
        Ok(oid)
    }
}

/// In-memory directory trie used to write nested trees bottom-up.
#[derive(Default)]
struct DirNode {
    blobs: BTreeMap<String, (i32, git2::Oid)>,
    dirs: BTreeMap<String, DirNode>,
}

impl DirNode {
    fn insert(&mut self, path: &str, mode: i32, oid: git2::Oid) {
        match path.split_once('/') {
            Some((dir, rest)) => self
                .dirs
                .entry(dir.to_string())
                .or_default()
                .insert(rest, mode, oid),
            None => {
                // A file replacing a directory (or vice versa) keeps the
                // last writer, matching tree-update semantics.
                self.dirs.remove(path);
                self.blobs.insert(path.to_string(), (mode, oid));
            }
        }
    }
}

impl ObjectStore {
    fn write_dir(&self, node: &DirNode) -> Result<git2::Oid, GitError> {
        let mut builder = self.repo.treebuilder(None)?;
        for (name, child) in &node.dirs {
            let child_id = self.write_dir(child)?;
            builder.insert(name, child_id, 0o040000)?;
        }
        for (name, (mode, oid)) in &node.blobs {
            builder.insert(name, *oid, *mode)?;
        }
        Ok(builder.write()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        test_support::init_repo_with_commit(dir.path()).unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_open_missing_repo() {
        let dir = TempDir::new().unwrap();
        let result = ObjectStore::open(dir.path());
        assert!(matches!(
            result,
            Err(GitError::RepositoryNotFound { .. })
        ));
    }

    #[test]
    fn test_head_resolves() {
        let (_dir, store) = fixture();
        let head = store.head().unwrap();
        assert!(store.commit_exists(head));
    }

    #[test]
    fn test_lookup_missing_ref_is_none() {
        let (_dir, store) = fixture();
        let result = store.lookup_ref("refs/heads/entire/nope").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_set_and_remove_ref() {
        let (_dir, store) = fixture();
        let head = store.head().unwrap();

        store
            .set_ref("refs/heads/entire/abc1234", head, "test")
            .unwrap();
        assert_eq!(
            store.lookup_ref("refs/heads/entire/abc1234").unwrap(),
            Some(head)
        );

        store.remove_ref("refs/heads/entire/abc1234").unwrap();
        assert!(store.lookup_ref("refs/heads/entire/abc1234").unwrap().is_none());

        let err = store.remove_ref("refs/heads/entire/abc1234");
        assert!(matches!(err, Err(GitError::RefNotFound { .. })));
    }

    #[test]
    fn test_build_tree_nested_paths() {
        let (_dir, store) = fixture();
        let blob = store.blob_from_bytes(b"content").unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("a/b/c.txt".to_string(), (FILEMODE_BLOB, blob));
        entries.insert("a/d.txt".to_string(), (FILEMODE_BLOB, blob));
        entries.insert("top.txt".to_string(), (FILEMODE_BLOB, blob));

        let tree = store.build_tree(&entries).unwrap();
        let flat = store.flatten_tree(tree).unwrap();
        assert_eq!(flat.len(), 3);
        assert_eq!(flat["a/b/c.txt"].1, blob);
        assert_eq!(flat["a/d.txt"].1, blob);
        assert_eq!(flat["top.txt"].1, blob);
    }

    #[test]
    fn test_update_tree_upsert_and_delete() {
        let (_dir, store) = fixture();
        let blob_a = store.blob_from_bytes(b"a").unwrap();
        let blob_b = store.blob_from_bytes(b"b").unwrap();

        let mut entries = BTreeMap::new();
        entries.insert("keep.txt".to_string(), (FILEMODE_BLOB, blob_a));
        entries.insert("drop.txt".to_string(), (FILEMODE_BLOB, blob_a));
        let base = store.build_tree(&entries).unwrap();

        let mut upserts = BTreeMap::new();
        upserts.insert("new/file.txt".to_string(), (FILEMODE_BLOB, blob_b));
        let updated = store
            .update_tree(base, &upserts, &["drop.txt".to_string()])
            .unwrap();

        let flat = store.flatten_tree(updated).unwrap();
        assert_eq!(flat.len(), 2);
        assert!(flat.contains_key("keep.txt"));
        assert!(flat.contains_key("new/file.txt"));
        assert!(!flat.contains_key("drop.txt"));
    }

    #[test]
    fn test_tree_blob_at() {
        let (_dir, store) = fixture();
        let blob = store.blob_from_bytes(b"x").unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("src/lib.rs".to_string(), (FILEMODE_BLOB, blob));
        let tree = store.build_tree(&entries).unwrap();

        assert_eq!(store.tree_blob_at(tree, "src/lib.rs").unwrap(), Some(blob));
        assert_eq!(store.tree_blob_at(tree, "missing.rs").unwrap(), None);
    }

    #[test]
    fn test_diff_trees_classifies_changes() {
        let (_dir, store) = fixture();
        let blob_a = store.blob_from_bytes(b"a").unwrap();
        let blob_b = store.blob_from_bytes(b"b").unwrap();

        let mut old = BTreeMap::new();
        old.insert("same.txt".to_string(), (FILEMODE_BLOB, blob_a));
        old.insert("changed.txt".to_string(), (FILEMODE_BLOB, blob_a));
        old.insert("removed.txt".to_string(), (FILEMODE_BLOB, blob_a));
        let old_tree = store.build_tree(&old).unwrap();

        let mut new = BTreeMap::new();
        new.insert("same.txt".to_string(), (FILEMODE_BLOB, blob_a));
        new.insert("changed.txt".to_string(), (FILEMODE_BLOB, blob_b));
        new.insert("added.txt".to_string(), (FILEMODE_BLOB, blob_b));
        let new_tree = store.build_tree(&new).unwrap();

        let mut changes = store.diff_trees(old_tree, new_tree).unwrap();
        changes.sort_by(|a, b| a.path.cmp(&b.path));

        assert_eq!(changes.len(), 3);
        assert_eq!(changes[0].path, "added.txt");
        assert_eq!(changes[0].kind, ChangeKind::Added);
        assert_eq!(changes[1].path, "changed.txt");
        assert_eq!(changes[1].kind, ChangeKind::Modified);
        assert_eq!(changes[2].path, "removed.txt");
        assert_eq!(changes[2].kind, ChangeKind::Deleted);
    }

    #[test]
    fn test_make_commit_and_walk() {
        let (_dir, store) = fixture();
        let base = store.head().unwrap();
        let base_tree = store.commit_object(base).unwrap().tree_id;

        let blob = store.blob_from_bytes(b"one").unwrap();
        let mut upserts = BTreeMap::new();
        upserts.insert("one.txt".to_string(), (FILEMODE_BLOB, blob));
        let tree1 = store.update_tree(base_tree, &upserts, &[]).unwrap();
        let c1 = store.make_commit(tree1, &[base], "Checkpoint 1").unwrap();

        let blob2 = store.blob_from_bytes(b"two").unwrap();
        let mut upserts2 = BTreeMap::new();
        upserts2.insert("two.txt".to_string(), (FILEMODE_BLOB, blob2));
        let tree2 = store.update_tree(tree1, &upserts2, &[]).unwrap();
        let c2 = store.make_commit(tree2, &[c1], "Checkpoint 2").unwrap();

        let chain = store.walk(c2, Some(base)).unwrap();
        assert_eq!(chain, vec![c2, c1]);

        let info = store.commit_object(c2).unwrap();
        assert_eq!(info.parent_ids, vec![c1]);
        assert_eq!(info.message, "Checkpoint 2");
    }

    #[test]
    fn test_orphan_commit_has_no_parents() {
        let (_dir, store) = fixture();
        let blob = store.blob_from_bytes(b"meta").unwrap();
        let mut entries = BTreeMap::new();
        entries.insert("ab/cdef012345/metadata.json".to_string(), (FILEMODE_BLOB, blob));
        let tree = store.build_tree(&entries).unwrap();

        let commit = store.make_commit(tree, &[], "Condense abcdef012345").unwrap();
        let info = store.commit_object(commit).unwrap();
        assert!(info.parent_ids.is_empty());
    }

    #[test]
    fn test_resolve_commit_by_prefix() {
        let (_dir, store) = fixture();
        let head = store.head().unwrap();
        let short = head.to_string()[..7].to_string();
        assert_eq!(store.resolve_commit(&short).unwrap(), head);
        assert!(store.resolve_commit("0000000").is_err());
    }

    #[test]
    fn test_amend_head_message() {
        let (dir, store) = fixture();
        test_support::commit_file(dir.path(), "hello.txt", "hi", "Add hello").unwrap();

        let amended = store.amend_head_message("Add hello\n\nEntire-Checkpoint: abc\n").unwrap();
        let info = store.commit_object(amended).unwrap();
        assert!(info.message.contains("Entire-Checkpoint: abc"));
        assert_eq!(store.head().unwrap(), amended);
    }
}
