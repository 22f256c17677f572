use clap::ArgMatches;
use tracing::info;

use entire_core::hooks::install;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_disable_command(_matches: &ArgMatches) -> CommandResult {
    let (store, _sessions) = open_repo()?;

    let removed = install::uninstall_git_hooks(&store).map_err(|e| {
        eprintln!("Failed to remove git hooks: {}", e);
        e
    })?;

    if removed.is_empty() {
        println!("No entire git hooks were installed.");
    } else {
        for hook in &removed {
            println!("  {} Removed .git/hooks/{}", color::success("✓"), hook);
        }
        println!();
        println!("Checkpointing disabled. Shadow branches and session records are kept;");
        println!("run {} to delete them too.", color::bold("entire reset --force"));
    }

    info!(event = "cli.disable_completed", removed = removed.len());
    Ok(())
}
