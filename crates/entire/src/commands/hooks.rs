use clap::ArgMatches;

use entire_core::hooks::install;
use entire_core::transcripts::types::AgentType;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_hooks_command(matches: &ArgMatches) -> CommandResult {
    let agent_name = matches
        .get_one::<String>("agent")
        .ok_or("Agent argument is required")?;
    let verb = matches
        .get_one::<String>("verb")
        .ok_or("Verb argument is required")?;

    let agent: AgentType = agent_name.parse().map_err(|e: String| {
        eprintln!("{}", e);
        e
    })?;

    let (store, _sessions) = open_repo()?;
    let worktree = store.workdir()?;

    match verb.as_str() {
        "install" => {
            let path = install::install_agent_hooks(agent, &worktree).map_err(|e| {
                eprintln!("Failed to install {} hooks: {}", agent, e);
                e
            })?;
            println!("  {} Configured {}", color::success("✓"), path.display());
        }
        "uninstall" => {
            let path = install::uninstall_agent_hooks(agent, &worktree).map_err(|e| {
                eprintln!("Failed to uninstall {} hooks: {}", agent, e);
                e
            })?;
            println!("  {} Cleaned {}", color::success("✓"), path.display());
        }
        "status" => {
            let installed = install::agent_hooks_installed(agent, &worktree);
            println!(
                "{} hooks: {}",
                agent,
                if installed {
                    color::success("installed")
                } else {
                    color::warning("not installed")
                }
            );
        }
        other => {
            eprintln!("Unknown verb '{}'. Use install, uninstall, or status.", other);
            return Err("unknown verb".into());
        }
    }
    Ok(())
}
