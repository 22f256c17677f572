use crate::errors::EntireError;

#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Failed to parse transcript: {message}")]
    ParseError { message: String },

    #[error("Transcript entry '{uuid}' not found")]
    EntryNotFound { uuid: String },

    #[error("IO error on transcript file: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for TranscriptError {
    fn error_code(&self) -> &'static str {
        match self {
            TranscriptError::ParseError { .. } => "TRANSCRIPT_PARSE_ERROR",
            TranscriptError::EntryNotFound { .. } => "TRANSCRIPT_ENTRY_NOT_FOUND",
            TranscriptError::IoError { .. } => "TRANSCRIPT_IO_ERROR",
        }
    }
}
