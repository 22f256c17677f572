use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum ShadowError {
    #[error("Session state error: {source}")]
    Session {
        #[from]
        source: crate::sessions::errors::SessionError,
    },

    #[error("Git operation failed: {source}")]
    Git {
        #[from]
        source: entire_git::GitError,
    },

    #[error("IO error during snapshot: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for ShadowError {
    fn error_code(&self) -> &'static str {
        match self {
            ShadowError::Session { .. } => "SHADOW_SESSION_ERROR",
            ShadowError::Git { .. } => "SHADOW_GIT_ERROR",
            ShadowError::IoError { .. } => "SHADOW_IO_ERROR",
        }
    }
}
