//! Per-worktree advisory lock for state mutations.
//!
//! Every mutation of the session store, every shadow append, and the whole
//! of condensation run under this lock. Readers do not take it. The lock
//! is a `flock` on `.git/entire-sessions/.lock`, released on drop (RAII).
//! Acquisition is non-blocking with a bounded retry so a stuck holder
//! surfaces as `LockTimeout` instead of hanging the agent's hook.

use std::fs;
use std::path::Path;
use std::time::{Duration, Instant};

use nix::fcntl::{Flock, FlockArg};
use tracing::warn;

use super::errors::SessionError;

const LOCK_FILE: &str = ".lock";
const RETRY_INTERVAL: Duration = Duration::from_millis(100);
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// Exclusive lock guard over a sessions directory.
pub struct SessionLock {
    _lock: Flock<fs::File>,
}

/// Acquire the exclusive mutation lock for `sessions_dir`, creating the
/// directory and lock file as needed.
pub fn acquire(sessions_dir: &Path) -> Result<SessionLock, SessionError> {
    fs::create_dir_all(sessions_dir)?;
    let lock_path = sessions_dir.join(LOCK_FILE);
    let deadline = Instant::now() + ACQUIRE_TIMEOUT;

    loop {
        let file = fs::OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&lock_path)?;

        match Flock::lock(file, FlockArg::LockExclusiveNonblock) {
            Ok(lock) => return Ok(SessionLock { _lock: lock }),
            Err((_, nix::errno::Errno::EWOULDBLOCK)) => {
                if Instant::now() >= deadline {
                    warn!(
                        event = "core.session.lock_timeout",
                        path = %lock_path.display(),
                    );
                    return Err(SessionError::LockTimeout {
                        path: lock_path.display().to_string(),
                    });
                }
                std::thread::sleep(RETRY_INTERVAL);
            }
            Err((_, errno)) => {
                return Err(SessionError::IoError {
                    source: std::io::Error::from(errno),
                });
            }
        }
    }
}
