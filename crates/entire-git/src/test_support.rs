//! Test helpers for creating git repositories, commits, and worktrees.
//!
//! These functions wrap git2 operations so test code in other crates
//! doesn't need to import git2 directly.

use std::path::Path;

use git2::{Repository, Signature, WorktreeAddOptions};

use crate::errors::GitError;

fn test_signature() -> Result<Signature<'static>, GitError> {
    Ok(Signature::now("Test", "test@test.com")?)
}

/// Initialize a new git repository at the given path with an initial commit.
pub fn init_repo_with_commit(path: &Path) -> Result<(), GitError> {
    let repo = Repository::init(path)?;
    let sig = test_signature()?;
    let tree_id = repo.index()?.write_tree()?;
    let tree = repo.find_tree(tree_id)?;
    repo.commit(Some("HEAD"), &sig, &sig, "Initial commit", &tree, &[])?;
    Ok(())
}

/// Write a file in the working tree and commit it on HEAD, like a user
/// running `git add <path> && git commit -m <message>`.
pub fn commit_file(
    repo_path: &Path,
    rel_path: &str,
    content: &str,
    message: &str,
) -> Result<git2::Oid, GitError> {
    let repo = Repository::open(repo_path)?;
    let file_path = repo_path.join(rel_path);
    if let Some(parent) = file_path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(&file_path, content)?;

    let mut index = repo.index()?;
    index.add_path(Path::new(rel_path))?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let sig = test_signature()?;
    let parent = repo.head()?.peel_to_commit()?;
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;
    Ok(oid)
}

/// Commit the entire current working tree state on HEAD (adds everything,
/// including deletions), returning the new commit id.
pub fn commit_all(repo_path: &Path, message: &str) -> Result<git2::Oid, GitError> {
    let repo = Repository::open(repo_path)?;
    let mut index = repo.index()?;
    index.add_all(["*"].iter(), git2::IndexAddOption::DEFAULT, None)?;
    index.update_all(["*"].iter(), None)?;
    index.write()?;
    let tree_id = index.write_tree()?;
    let tree = repo.find_tree(tree_id)?;

    let sig = test_signature()?;
    let parent = repo.head()?.peel_to_commit()?;
    let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &[&parent])?;
    Ok(oid)
}

/// Clone a local repository, preserving commit ids.
pub fn clone_local(src: &Path, dst: &Path) -> Result<(), GitError> {
    let url = format!("file://{}", src.display());
    Repository::clone(&url, dst)?;
    Ok(())
}

/// Create a linked worktree on a new branch pointing at HEAD.
pub fn create_linked_worktree(
    repo_path: &Path,
    name: &str,
    worktree_path: &Path,
) -> Result<(), GitError> {
    let repo = Repository::open(repo_path)?;
    let head = repo.head()?.peel_to_commit()?;
    let branch = repo.branch(name, &head, false)?;
    let branch_ref = branch.into_reference();
    let mut opts = WorktreeAddOptions::new();
    opts.reference(Some(&branch_ref));
    repo.worktree(name, worktree_path, Some(&opts))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_init_repo_with_commit() {
        let dir = TempDir::new().unwrap();
        init_repo_with_commit(dir.path()).unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Initial commit"));
    }

    #[test]
    fn test_commit_file_creates_nested_path() {
        let dir = TempDir::new().unwrap();
        init_repo_with_commit(dir.path()).unwrap();

        commit_file(dir.path(), "src/deep/mod.rs", "pub fn f() {}", "Add mod").unwrap();

        assert!(dir.path().join("src/deep/mod.rs").exists());
        let repo = Repository::open(dir.path()).unwrap();
        let head = repo.head().unwrap().peel_to_commit().unwrap();
        assert_eq!(head.message(), Some("Add mod"));
        let tree = head.tree().unwrap();
        assert!(tree.get_path(Path::new("src/deep/mod.rs")).is_ok());
    }

    #[test]
    fn test_commit_all_picks_up_deletions() {
        let dir = TempDir::new().unwrap();
        init_repo_with_commit(dir.path()).unwrap();
        commit_file(dir.path(), "gone.txt", "bye", "Add gone").unwrap();

        std::fs::remove_file(dir.path().join("gone.txt")).unwrap();
        std::fs::write(dir.path().join("new.txt"), "hi").unwrap();
        commit_all(dir.path(), "Replace").unwrap();

        let repo = Repository::open(dir.path()).unwrap();
        let tree = repo.head().unwrap().peel_to_commit().unwrap().tree().unwrap();
        assert!(tree.get_path(Path::new("gone.txt")).is_err());
        assert!(tree.get_path(Path::new("new.txt")).is_ok());
    }

    #[test]
    fn test_create_linked_worktree() {
        let dir = TempDir::new().unwrap();
        init_repo_with_commit(dir.path()).unwrap();

        let wt_dir = TempDir::new().unwrap();
        let wt_path = wt_dir.path().join("linked");
        create_linked_worktree(dir.path(), "linked", &wt_path).unwrap();

        let wt_repo = Repository::open(&wt_path).unwrap();
        assert!(wt_repo.head().is_ok());
    }
}
