//! Session file persistence.
//!
//! One JSON file per session record, written atomically via temp file +
//! rename. Invalid files are skipped (with a warning) when listing so one
//! corrupt record can't hide the rest.

use std::fs;
use std::path::{Path, PathBuf};

use super::errors::SessionError;
use super::types::SessionRecord;

fn record_file(sessions_dir: &Path, session_id: &str) -> PathBuf {
    sessions_dir.join(format!("{}.json", session_id.replace('/', "_")))
}

fn cleanup_temp_file(temp_file: &Path, original_error: &std::io::Error) {
    if let Err(cleanup_err) = fs::remove_file(temp_file) {
        tracing::warn!(
            event = "core.session.temp_file_cleanup_failed",
            temp_file = %temp_file.display(),
            original_error = %original_error,
            cleanup_error = %cleanup_err,
        );
    }
}

pub fn save_record(record: &SessionRecord, sessions_dir: &Path) -> Result<(), SessionError> {
    fs::create_dir_all(sessions_dir)?;
    let path = record_file(sessions_dir, &record.session_id);
    let json = serde_json::to_string_pretty(record).map_err(|e| SessionError::StateCorruption {
        file: path.display().to_string(),
        message: e.to_string(),
    })?;

    let temp_file = path.with_extension("json.tmp");
    if let Err(e) = fs::write(&temp_file, &json) {
        cleanup_temp_file(&temp_file, &e);
        return Err(SessionError::IoError { source: e });
    }
    if let Err(e) = fs::rename(&temp_file, &path) {
        cleanup_temp_file(&temp_file, &e);
        return Err(SessionError::IoError { source: e });
    }
    Ok(())
}

/// Load one record by exposed session id. `None` when the file is absent;
/// parse failures are real errors (the caller asked for this session).
pub fn load_record(
    session_id: &str,
    sessions_dir: &Path,
) -> Result<Option<SessionRecord>, SessionError> {
    let path = record_file(sessions_dir, session_id);
    let content = match fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SessionError::IoError { source: e }),
    };
    let record =
        serde_json::from_str(&content).map_err(|e| SessionError::StateCorruption {
            file: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(record))
}

/// Best-effort delete; absent files are fine.
pub fn remove_record(session_id: &str, sessions_dir: &Path) -> Result<(), SessionError> {
    let path = record_file(sessions_dir, session_id);
    match fs::remove_file(&path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(SessionError::IoError { source: e }),
    }
}

/// Enumerate every record. Returns the records plus how many files were
/// skipped as unreadable or invalid.
pub fn list_records(sessions_dir: &Path) -> Result<(Vec<SessionRecord>, usize), SessionError> {
    let mut records = Vec::new();
    let mut skipped = 0;

    if !sessions_dir.exists() {
        return Ok((records, skipped));
    }

    for entry in fs::read_dir(sessions_dir)? {
        let path = entry?.path();
        if path.extension().and_then(|s| s.to_str()) != Some("json") {
            continue;
        }

        let content = match fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    event = "core.session.list_read_error",
                    file = %path.display(),
                    error = %e,
                );
                continue;
            }
        };

        match serde_json::from_str::<SessionRecord>(&content) {
            Ok(record) => records.push(record),
            Err(e) => {
                skipped += 1;
                tracing::warn!(
                    event = "core.session.list_invalid_json",
                    file = %path.display(),
                    error = %e,
                );
            }
        }
    }

    Ok((records, skipped))
}
