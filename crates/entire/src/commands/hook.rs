//! Hook entry points. These are invoked by agents and by git, never by
//! hand; every path here swallows its errors, logs to stderr, and returns
//! success so a broken engine cannot block an agent turn or a commit.

use std::io::Read;
use std::path::Path;

use clap::ArgMatches;
use tracing::{error, warn};

use entire_core::hooks::{self, HookInput};
use entire_core::transcripts::types::AgentType;

use crate::commands::CommandResult;

pub(crate) fn handle_hook_command(matches: &ArgMatches) -> CommandResult {
    match matches.subcommand() {
        Some(("claude", _)) => agent_hook(AgentType::Claude),
        Some(("gemini", _)) => agent_hook(AgentType::Gemini),
        Some(("prepare-commit-msg", sub)) => {
            let msg_file = sub
                .get_one::<String>("msg-file")
                .ok_or("prepare-commit-msg requires the message file path")?;
            let source = sub.get_one::<String>("source").map(String::as_str);
            hooks::handle_prepare_commit_msg(Path::new(msg_file), source);
            Ok(())
        }
        Some(("post-commit", _)) => {
            hooks::handle_post_commit();
            Ok(())
        }
        _ => {
            warn!(event = "cli.hook.unknown_subcommand");
            Ok(())
        }
    }
}

/// Read one JSON event from stdin, dispatch, answer with at most one JSON
/// object on stdout. Malformed input logs and exits clean.
fn agent_hook(agent: AgentType) -> CommandResult {
    let mut raw = String::new();
    if let Err(e) = std::io::stdin().read_to_string(&mut raw) {
        error!(event = "cli.hook.stdin_read_failed", error = %e);
        return Ok(());
    }

    let input: HookInput = match serde_json::from_str(&raw) {
        Ok(input) => input,
        Err(e) => {
            error!(event = "cli.hook.payload_invalid", error = %e);
            return Ok(());
        }
    };

    let output = hooks::handle_agent_event(agent, &input);
    if !output.is_empty() {
        match serde_json::to_string(&output) {
            Ok(json) => println!("{}", json),
            Err(e) => error!(event = "cli.hook.reply_encode_failed", error = %e),
        }
    }
    Ok(())
}
