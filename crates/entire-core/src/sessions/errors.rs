use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session '{id}' not found")]
    NotFound { id: String },

    #[error("Session state file {file} is corrupt: {message}")]
    StateCorruption { file: String, message: String },

    #[error("Timed out waiting for session lock at {path}")]
    LockTimeout { path: String },

    #[error("Git operation failed: {source}")]
    GitError {
        #[from]
        source: entire_git::GitError,
    },

    #[error("IO operation failed: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for SessionError {
    fn error_code(&self) -> &'static str {
        match self {
            SessionError::NotFound { .. } => "NO_SUCH_SESSION",
            SessionError::StateCorruption { .. } => "STATE_CORRUPTION",
            SessionError::LockTimeout { .. } => "LOCK_TIMEOUT",
            SessionError::GitError { .. } => "GIT_ERROR",
            SessionError::IoError { .. } => "IO_ERROR",
        }
    }

    fn is_user_error(&self) -> bool {
        matches!(self, SessionError::NotFound { .. })
    }
}
