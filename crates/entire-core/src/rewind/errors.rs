use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum RewindError {
    #[error("Rewind point '{id}' not found")]
    PointNotFound { id: String },

    #[error(
        "Checkpoint '{id}' is logs-only: its tree was retired at condensation and can no longer be replayed"
    )]
    NotReplayable { id: String },

    #[error(
        "Working directory has uncommitted changes outside the session's files: {paths:?}. Commit or stash them first"
    )]
    WorkingTreeDirty { paths: Vec<String> },

    #[error("No active session on the current commit")]
    NoActiveSession,

    #[error("Session state error: {source}")]
    Session {
        #[from]
        source: crate::sessions::errors::SessionError,
    },

    #[error("Snapshot failed: {source}")]
    Shadow {
        #[from]
        source: crate::shadow::errors::ShadowError,
    },

    #[error("Git operation failed: {source}")]
    Git {
        #[from]
        source: entire_git::GitError,
    },

    #[error("IO error during rewind: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for RewindError {
    fn error_code(&self) -> &'static str {
        match self {
            RewindError::PointNotFound { .. } => "REWIND_POINT_NOT_FOUND",
            RewindError::NotReplayable { .. } => "REWIND_NOT_REPLAYABLE",
            RewindError::WorkingTreeDirty { .. } => "WORKING_TREE_DIRTY",
            RewindError::NoActiveSession => "NO_ACTIVE_SESSION",
            RewindError::Session { .. } => "REWIND_SESSION_ERROR",
            RewindError::Shadow { .. } => "REWIND_SNAPSHOT_ERROR",
            RewindError::Git { .. } => "REWIND_GIT_ERROR",
            RewindError::IoError { .. } => "REWIND_IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(
            self,
            RewindError::PointNotFound { .. }
                | RewindError::NotReplayable { .. }
                | RewindError::WorkingTreeDirty { .. }
                | RewindError::NoActiveSession
        )
    }
}
