//! Hierarchical configuration loading.
//!
//! User config (`~/.entire/config.toml`) is read first, then the repo
//! config (`<worktree>/.entire/config.toml`) replaces any field it sets.
//! Environment variables override both. A malformed file warns and is
//! ignored so a broken config can never take a hook down with it.

use std::path::{Path, PathBuf};

use tracing::warn;

use super::errors::ConfigError;
use super::types::EntireConfig;

/// Location of the user-level config file, if a home directory exists.
pub fn user_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".entire").join("config.toml"))
}

/// Location of the repo-level config file.
pub fn repo_config_path(worktree: &Path) -> PathBuf {
    worktree.join(".entire").join("config.toml")
}

/// Load the full hierarchy for a worktree. Missing files are fine;
/// malformed files warn and fall back to the previous layer.
pub fn load_hierarchy(worktree: &Path) -> EntireConfig {
    let mut config = EntireConfig::default();

    if let Some(user_path) = user_config_path() {
        if let Some(user) = load_file(&user_path) {
            config = user;
        }
    }
    if let Some(repo) = load_file(&repo_config_path(worktree)) {
        config = merge(config, repo);
    }

    apply_env_overrides(&mut config);
    config
}

/// Parse one config file. `None` when the file is absent or unreadable.
fn load_file(path: &Path) -> Option<EntireConfig> {
    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(
                event = "core.config.read_failed",
                path = %path.display(),
                error = %e,
            );
            return None;
        }
    };
    match parse(&content) {
        Ok(config) => Some(config),
        Err(e) => {
            warn!(
                event = "core.config.parse_failed",
                path = %path.display(),
                error = %e,
            );
            None
        }
    }
}

/// Parse TOML into a config, surfacing the error for CLI validation paths.
pub fn parse(content: &str) -> Result<EntireConfig, ConfigError> {
    toml::from_str(content).map_err(|e| ConfigError::ConfigParseError {
        message: e.to_string(),
    })
}

/// Repo-level values replace user-level ones field by field. Because every
/// field has a serde default we cannot distinguish "unset" from "default",
/// so repo config wins wholesale; this matches the one-file-per-layer
/// behavior users expect from a replace-style hierarchy.
fn merge(_user: EntireConfig, repo: EntireConfig) -> EntireConfig {
    repo
}

fn apply_env_overrides(config: &mut EntireConfig) {
    if env_truthy("ENTIRE_TELEMETRY_OPTOUT") {
        config.telemetry_optout = true;
    }
    if env_truthy("ACCESSIBLE") {
        config.accessible = true;
    }
}

fn env_truthy(name: &str) -> bool {
    std::env::var(name)
        .map(|v| !v.is_empty() && v != "0" && !v.eq_ignore_ascii_case("false"))
        .unwrap_or(false)
}
