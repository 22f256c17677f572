//! Hook dispatch.
//!
//! Every handler follows the same policy: errors are logged to stderr and
//! swallowed, the hook replies with at most a `systemMessage`, and the
//! process exits 0 so a broken checkpoint engine can never block the
//! agent or the user's commit.

use std::path::{Path, PathBuf};

use entire_git::ObjectStore;
use tracing::{error, info, warn};

use super::types::{HookEvent, HookInput, HookOutput};
use crate::condense;
use crate::sessions::SessionStore;
use crate::shadow::{self, engine::find_session_by_raw_id, InitRequest};
use crate::transcripts::types::AgentType;

fn open_repo(cwd: Option<&Path>) -> Option<(ObjectStore, SessionStore)> {
    let path = match cwd {
        Some(p) => p.to_path_buf(),
        None => std::env::current_dir().ok()?,
    };
    match ObjectStore::open(&path) {
        Ok(store) => {
            let sessions = SessionStore::for_repo(&store);
            Some((store, sessions))
        }
        Err(e) => {
            warn!(event = "core.hooks.repo_open_failed", error = %e);
            None
        }
    }
}

/// Dispatch one agent lifecycle event. Never fails; the reply is empty
/// unless the engine has something to tell the agent.
pub fn handle_agent_event(agent: AgentType, input: &HookInput) -> HookOutput {
    let Some(event) = HookEvent::parse(&input.hook_event_name) else {
        info!(
            event = "core.hooks.unknown_event",
            name = %input.hook_event_name,
        );
        return HookOutput::default();
    };

    match event {
        HookEvent::SessionStart => session_start(input),
        HookEvent::UserPromptSubmit => user_prompt_submit(agent, input),
        HookEvent::PreToolUse | HookEvent::PostToolUse => HookOutput::default(),
        HookEvent::Stop => stop(input),
    }
}

fn session_start(input: &HookInput) -> HookOutput {
    let Some((store, sessions)) = open_repo(input.cwd.as_deref()) else {
        return HookOutput::default();
    };
    match shadow::session_start_warning(&store, &sessions, &input.session_id) {
        Ok(Some(message)) => HookOutput::message(message),
        Ok(None) => HookOutput::default(),
        Err(e) => {
            error!(event = "core.hooks.session_start_failed", error = %e);
            HookOutput::default()
        }
    }
}

fn user_prompt_submit(agent: AgentType, input: &HookInput) -> HookOutput {
    let Some((store, sessions)) = open_repo(input.cwd.as_deref()) else {
        return HookOutput::default();
    };
    let request = InitRequest {
        raw_session_id: input.session_id.clone(),
        agent_type: agent,
        transcript_path: input
            .transcript_path
            .clone()
            .unwrap_or_else(PathBuf::new),
    };
    match shadow::initialize_session(&store, &sessions, &request) {
        Ok(outcome) => {
            if let Some(conflict) = outcome.conflict {
                // The SessionStart hook already warned; just log here.
                info!(
                    event = "core.hooks.prompt_with_conflict",
                    existing_session = %conflict.existing_session_id,
                );
            }
            HookOutput::default()
        }
        Err(e) => {
            error!(event = "core.hooks.initialize_failed", error = %e);
            HookOutput::default()
        }
    }
}

fn stop(input: &HookInput) -> HookOutput {
    let Some((store, sessions)) = open_repo(input.cwd.as_deref()) else {
        return HookOutput::default();
    };
    let record = match find_session_by_raw_id(&sessions, &input.session_id) {
        Ok(Some(record)) => record,
        Ok(None) => {
            info!(
                event = "core.hooks.stop_without_session",
                session_id = %input.session_id,
            );
            return HookOutput::default();
        }
        Err(e) => {
            error!(event = "core.hooks.stop_lookup_failed", error = %e);
            return HookOutput::default();
        }
    };
    if let Err(e) = shadow::append_checkpoint(&store, &sessions, &record.session_id) {
        error!(event = "core.hooks.checkpoint_failed", error = %e);
    }
    HookOutput::default()
}

/// The `prepare-commit-msg` git hook: insert or restore the checkpoint
/// trailer. Failures log and fall through; the commit proceeds untouched.
pub fn handle_prepare_commit_msg(msg_file: &Path, source: Option<&str>) {
    let Some((store, sessions)) = open_repo(None) else {
        return;
    };
    match condense::prepare(&store, &sessions, msg_file, source) {
        Ok(outcome) => {
            info!(event = "core.hooks.prepare_commit_msg", outcome = ?outcome);
        }
        Err(e) => {
            error!(event = "core.hooks.prepare_failed", error = %e);
        }
    }
}

/// The `post-commit` git hook: condense the shadow branch. A failure here
/// never rolls the user's commit back; the next commit retries.
pub fn handle_post_commit() {
    let Some((store, sessions)) = open_repo(None) else {
        return;
    };
    match condense::finalize(&store, &sessions) {
        Ok(outcome) => {
            info!(event = "core.hooks.post_commit", outcome = ?outcome);
        }
        Err(e) => {
            error!(event = "core.hooks.finalize_failed", error = %e);
        }
    }
}
