#[derive(Debug, thiserror::Error)]
pub enum GitError {
    #[error("Not in a git repository")]
    NotInRepository,

    #[error("Repository not found at path: {path}")]
    RepositoryNotFound { path: String },

    #[error("Path is not inside a git worktree: {path}")]
    NotAWorktree { path: String },

    #[error("Reference '{name}' not found")]
    RefNotFound { name: String },

    #[error("Object '{oid}' not found")]
    ObjectNotFound { oid: String },

    #[error("Repository has no commits yet (unborn HEAD)")]
    UnbornHead,

    #[error("Git operation failed: {message}")]
    OperationFailed { message: String },

    #[error("Git2 library error: {source}")]
    Git2Error {
        #[from]
        source: git2::Error,
    },

    #[error("IO error during git operation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_git_error_display() {
        let error = GitError::NotInRepository;
        assert_eq!(error.to_string(), "Not in a git repository");
    }

    #[test]
    fn test_ref_not_found_display() {
        let error = GitError::RefNotFound {
            name: "refs/heads/entire/abc1234".to_string(),
        };
        assert!(error.to_string().contains("refs/heads/entire/abc1234"));
    }

    #[test]
    fn test_object_not_found_display() {
        let error = GitError::ObjectNotFound {
            oid: "deadbeef".to_string(),
        };
        assert!(error.to_string().contains("deadbeef"));
    }
}
