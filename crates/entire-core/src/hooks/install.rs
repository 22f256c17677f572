//! Hook installation: git hook shims in `.git/hooks/` and agent settings
//! patches (`.claude/settings.json`, `.gemini/settings.json`).
//!
//! Git hook shims chain: a pre-existing hook is renamed to
//! `<name>.pre-entire` and invoked first, so enabling checkpoints never
//! silently disables another tool's hooks.

use std::path::{Path, PathBuf};

use entire_git::ObjectStore;
use tracing::info;

use crate::errors::EntireError;
use crate::transcripts::types::AgentType;

#[derive(Debug, thiserror::Error)]
pub enum InstallError {
    #[error("Git operation failed: {source}")]
    Git {
        #[from]
        source: entire_git::GitError,
    },

    #[error("Failed to parse {path}: {message}")]
    SettingsParse { path: String, message: String },

    #[error("IO error during hook installation: {source}")]
    IoError {
        #[from]
        source: std::io::Error,
    },
}

impl EntireError for InstallError {
    fn error_code(&self) -> &'static str {
        match self {
            InstallError::Git { .. } => "INSTALL_GIT_ERROR",
            InstallError::SettingsParse { .. } => "INSTALL_SETTINGS_PARSE",
            InstallError::IoError { .. } => "INSTALL_IO_ERROR",
        }
    }
}

const GIT_HOOK_MARKER: &str = "# entire checkpoint hook";
const GIT_HOOKS: &[(&str, &str)] = &[
    ("prepare-commit-msg", "entire hook prepare-commit-msg"),
    ("post-commit", "entire hook post-commit"),
];

/// Agent events that get a hook entry. PreToolUse/PostToolUse are
/// reserved in the dispatch table and not installed.
const AGENT_EVENTS: &[&str] = &["SessionStart", "UserPromptSubmit", "Stop"];

fn hooks_dir(store: &ObjectStore) -> PathBuf {
    // Shared across linked worktrees, like git itself resolves hooks.
    store.common_dir().join("hooks")
}

fn shim_script(command: &str) -> String {
    format!(
        "#!/bin/sh\n{}\nif [ -x \"$0.pre-entire\" ]; then\n  \"$0.pre-entire\" \"$@\" || exit $?\nfi\nexec {} \"$@\"\n",
        GIT_HOOK_MARKER, command
    )
}

fn is_entire_shim(path: &Path) -> bool {
    std::fs::read_to_string(path)
        .map(|content| content.contains(GIT_HOOK_MARKER))
        .unwrap_or(false)
}

#[cfg(unix)]
fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;
    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(perms.mode() | 0o755);
    std::fs::set_permissions(path, perms)?;
    Ok(())
}

#[cfg(not(unix))]
fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

/// Install the git-side hooks. Returns the hook names written.
pub fn install_git_hooks(store: &ObjectStore) -> Result<Vec<String>, InstallError> {
    let dir = hooks_dir(store);
    std::fs::create_dir_all(&dir)?;

    let mut installed = Vec::new();
    for (name, command) in GIT_HOOKS {
        let path = dir.join(name);
        if path.exists() && !is_entire_shim(&path) {
            std::fs::rename(&path, dir.join(format!("{}.pre-entire", name)))?;
        }
        std::fs::write(&path, shim_script(command))?;
        make_executable(&path)?;
        installed.push(name.to_string());
    }
    info!(event = "core.install.git_hooks_installed", dir = %dir.display());
    Ok(installed)
}

/// Remove the git-side hooks, restoring any chained originals.
pub fn uninstall_git_hooks(store: &ObjectStore) -> Result<Vec<String>, InstallError> {
    let dir = hooks_dir(store);
    let mut removed = Vec::new();
    for (name, _command) in GIT_HOOKS {
        let path = dir.join(name);
        if !path.exists() || !is_entire_shim(&path) {
            continue;
        }
        std::fs::remove_file(&path)?;
        let chained = dir.join(format!("{}.pre-entire", name));
        if chained.exists() {
            std::fs::rename(&chained, &path)?;
        }
        removed.push(name.to_string());
    }
    info!(event = "core.install.git_hooks_removed", dir = %dir.display());
    Ok(removed)
}

/// True when every git-side hook is our shim.
pub fn git_hooks_installed(store: &ObjectStore) -> bool {
    let dir = hooks_dir(store);
    GIT_HOOKS
        .iter()
        .all(|(name, _)| is_entire_shim(&dir.join(name)))
}

fn settings_path(agent: AgentType, worktree: &Path) -> PathBuf {
    match agent {
        AgentType::Claude => worktree.join(".claude").join("settings.json"),
        AgentType::Gemini => worktree.join(".gemini").join("settings.json"),
    }
}

fn hook_command(agent: AgentType) -> String {
    format!("entire hook {}", agent.as_str())
}

fn load_settings(path: &Path) -> Result<serde_json::Value, InstallError> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            serde_json::from_str(&content).map_err(|e| InstallError::SettingsParse {
                path: path.display().to_string(),
                message: e.to_string(),
            })
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(serde_json::json!({}))
        }
        Err(e) => Err(InstallError::IoError { source: e }),
    }
}

fn save_settings(path: &Path, settings: &serde_json::Value) -> Result<(), InstallError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let content =
        serde_json::to_string_pretty(settings).map_err(|e| InstallError::SettingsParse {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    std::fs::write(path, content + "\n")?;
    Ok(())
}

fn event_has_command(event_entries: &serde_json::Value, command: &str) -> bool {
    event_entries
        .as_array()
        .map(|groups| {
            groups.iter().any(|group| {
                group
                    .get("hooks")
                    .and_then(|h| h.as_array())
                    .map(|hooks| {
                        hooks.iter().any(|h| {
                            h.get("command").and_then(|c| c.as_str()) == Some(command)
                        })
                    })
                    .unwrap_or(false)
            })
        })
        .unwrap_or(false)
}

/// Patch the agent's settings file so its lifecycle hooks invoke
/// `entire hook <agent>`. Idempotent; other settings survive untouched.
pub fn install_agent_hooks(
    agent: AgentType,
    worktree: &Path,
) -> Result<PathBuf, InstallError> {
    let path = settings_path(agent, worktree);
    let mut settings = load_settings(&path)?;
    let command = hook_command(agent);

    let root = settings
        .as_object_mut()
        .ok_or_else(|| InstallError::SettingsParse {
            path: path.display().to_string(),
            message: "settings root is not an object".to_string(),
        })?;
    let hooks = root
        .entry("hooks")
        .or_insert_with(|| serde_json::json!({}));
    let hooks = hooks
        .as_object_mut()
        .ok_or_else(|| InstallError::SettingsParse {
            path: path.display().to_string(),
            message: "\"hooks\" is not an object".to_string(),
        })?;

    for event in AGENT_EVENTS {
        let entries = hooks
            .entry(*event)
            .or_insert_with(|| serde_json::json!([]));
        if event_has_command(entries, &command) {
            continue;
        }
        if let Some(groups) = entries.as_array_mut() {
            groups.push(serde_json::json!({
                "hooks": [{"type": "command", "command": command}]
            }));
        }
    }

    save_settings(&path, &settings)?;
    info!(
        event = "core.install.agent_hooks_installed",
        agent = %agent,
        path = %path.display(),
    );
    Ok(path)
}

/// Remove our hook entries from the agent's settings file. Other hooks
/// and settings survive.
pub fn uninstall_agent_hooks(
    agent: AgentType,
    worktree: &Path,
) -> Result<PathBuf, InstallError> {
    let path = settings_path(agent, worktree);
    if !path.exists() {
        return Ok(path);
    }
    let mut settings = load_settings(&path)?;
    let command = hook_command(agent);

    if let Some(hooks) = settings.get_mut("hooks").and_then(|h| h.as_object_mut()) {
        for event in AGENT_EVENTS {
            if let Some(groups) = hooks.get_mut(*event).and_then(|e| e.as_array_mut()) {
                for group in groups.iter_mut() {
                    if let Some(entries) =
                        group.get_mut("hooks").and_then(|h| h.as_array_mut())
                    {
                        entries.retain(|h| {
                            h.get("command").and_then(|c| c.as_str()) != Some(command.as_str())
                        });
                    }
                }
                groups.retain(|group| {
                    group
                        .get("hooks")
                        .and_then(|h| h.as_array())
                        .map(|entries| !entries.is_empty())
                        .unwrap_or(true)
                });
            }
        }
    }

    save_settings(&path, &settings)?;
    info!(
        event = "core.install.agent_hooks_removed",
        agent = %agent,
        path = %path.display(),
    );
    Ok(path)
}

/// True when every lifecycle event routes to `entire hook <agent>`.
pub fn agent_hooks_installed(agent: AgentType, worktree: &Path) -> bool {
    let path = settings_path(agent, worktree);
    let Ok(settings) = load_settings(&path) else {
        return false;
    };
    let command = hook_command(agent);
    let Some(hooks) = settings.get("hooks") else {
        return false;
    };
    AGENT_EVENTS.iter().all(|event| {
        hooks
            .get(*event)
            .map(|entries| event_has_command(entries, &command))
            .unwrap_or(false)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use entire_git::test_support;
    use tempfile::TempDir;

    fn fixture() -> (TempDir, ObjectStore) {
        let dir = TempDir::new().unwrap();
        test_support::init_repo_with_commit(dir.path()).unwrap();
        let store = ObjectStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_install_and_uninstall_git_hooks() {
        let (dir, store) = fixture();

        let installed = install_git_hooks(&store).unwrap();
        assert_eq!(installed.len(), 2);
        assert!(git_hooks_installed(&store));

        let prepare = dir.path().join(".git/hooks/prepare-commit-msg");
        let content = std::fs::read_to_string(&prepare).unwrap();
        assert!(content.contains("entire hook prepare-commit-msg"));
        assert!(content.contains(GIT_HOOK_MARKER));

        let removed = uninstall_git_hooks(&store).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!prepare.exists());
        assert!(!git_hooks_installed(&store));
    }

    #[test]
    fn test_install_chains_existing_hook() {
        let (dir, store) = fixture();
        let hooks_dir = dir.path().join(".git/hooks");
        std::fs::create_dir_all(&hooks_dir).unwrap();
        std::fs::write(
            hooks_dir.join("post-commit"),
            "#!/bin/sh\necho other tool\n",
        )
        .unwrap();

        install_git_hooks(&store).unwrap();

        let chained = hooks_dir.join("post-commit.pre-entire");
        assert!(chained.exists());
        assert!(std::fs::read_to_string(&chained)
            .unwrap()
            .contains("other tool"));

        // Uninstall restores the original.
        uninstall_git_hooks(&store).unwrap();
        let restored = std::fs::read_to_string(hooks_dir.join("post-commit")).unwrap();
        assert!(restored.contains("other tool"));
        assert!(!chained.exists());
    }

    #[test]
    fn test_install_is_idempotent() {
        let (dir, store) = fixture();
        install_git_hooks(&store).unwrap();
        install_git_hooks(&store).unwrap();
        // No .pre-entire backup of our own shim.
        assert!(!dir
            .path()
            .join(".git/hooks/post-commit.pre-entire")
            .exists());
    }

    #[test]
    fn test_agent_hooks_patch_preserves_settings() {
        let dir = TempDir::new().unwrap();
        let settings_file = dir.path().join(".claude/settings.json");
        std::fs::create_dir_all(settings_file.parent().unwrap()).unwrap();
        std::fs::write(
            &settings_file,
            r#"{"model": "opus", "hooks": {"Stop": [{"hooks": [{"type": "command", "command": "other-tool"}]}]}}"#,
        )
        .unwrap();

        install_agent_hooks(AgentType::Claude, dir.path()).unwrap();
        assert!(agent_hooks_installed(AgentType::Claude, dir.path()));

        let settings: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings_file).unwrap()).unwrap();
        assert_eq!(settings["model"], "opus");
        // The other tool's Stop hook survives alongside ours.
        let stop_groups = settings["hooks"]["Stop"].as_array().unwrap();
        assert_eq!(stop_groups.len(), 2);

        // Idempotent.
        install_agent_hooks(AgentType::Claude, dir.path()).unwrap();
        let settings: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings_file).unwrap()).unwrap();
        assert_eq!(settings["hooks"]["Stop"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_agent_hooks_uninstall_removes_only_ours() {
        let dir = TempDir::new().unwrap();
        let settings_file = dir.path().join(".claude/settings.json");
        std::fs::create_dir_all(settings_file.parent().unwrap()).unwrap();
        std::fs::write(
            &settings_file,
            r#"{"hooks": {"Stop": [{"hooks": [{"type": "command", "command": "other-tool"}]}]}}"#,
        )
        .unwrap();

        install_agent_hooks(AgentType::Claude, dir.path()).unwrap();
        uninstall_agent_hooks(AgentType::Claude, dir.path()).unwrap();
        assert!(!agent_hooks_installed(AgentType::Claude, dir.path()));

        let settings: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&settings_file).unwrap()).unwrap();
        let stop_groups = settings["hooks"]["Stop"].as_array().unwrap();
        assert_eq!(stop_groups.len(), 1);
        assert_eq!(
            stop_groups[0]["hooks"][0]["command"],
            "other-tool"
        );
    }

    #[test]
    fn test_gemini_settings_path() {
        let dir = TempDir::new().unwrap();
        let path = install_agent_hooks(AgentType::Gemini, dir.path()).unwrap();
        assert!(path.ends_with(".gemini/settings.json"));
        assert!(agent_hooks_installed(AgentType::Gemini, dir.path()));
    }
}
