use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum CondenseError {
    #[error("Session state error: {source}")]
    Session {
        #[from]
        source: crate::sessions::errors::SessionError,
    },

    #[error("Shadow engine error: {source}")]
    Shadow {
        #[from]
        source: crate::shadow::errors::ShadowError,
    },

    #[error("Git operation failed: {source}")]
    Git {
        #[from]
        source: entire_git::GitError,
    },

    #[error("Checkpoint metadata is corrupt at {path}: {message}")]
    MetadataCorruption { path: String, message: String },

    #[error("IO error during condensation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for CondenseError {
    fn error_code(&self) -> &'static str {
        match self {
            CondenseError::Session { .. } => "CONDENSE_SESSION_ERROR",
            CondenseError::Shadow { .. } => "CONDENSE_SHADOW_ERROR",
            CondenseError::Git { .. } => "CONDENSE_GIT_ERROR",
            CondenseError::MetadataCorruption { .. } => "CONDENSE_METADATA_CORRUPTION",
            CondenseError::IoError { .. } => "CONDENSE_IO_ERROR",
        }
    }
}
