use clap::ArgMatches;

use entire_core::config;
use entire_core::hooks::install;
use entire_core::identity;
use entire_core::transcripts::types::AgentType;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_status_command(_matches: &ArgMatches) -> CommandResult {
    let (store, sessions) = open_repo()?;
    let worktree = store.workdir()?;
    let loaded = config::load_hierarchy(&worktree);

    let git_hooks = install::git_hooks_installed(&store);
    println!(
        "Git hooks:      {}",
        if git_hooks {
            color::success("installed")
        } else {
            color::warning("not installed (run entire enable)")
        }
    );
    for agent in AgentType::all() {
        let installed = install::agent_hooks_installed(*agent, &worktree);
        println!(
            "{:<15} {}",
            format!("{} hooks:", agent),
            if installed {
                color::success("installed")
            } else {
                color::muted("not installed")
            }
        );
    }
    println!("Strategy:       {}", loaded.strategy);

    let head = match store.head() {
        Ok(head) => head,
        Err(_) => {
            println!("HEAD:           {}", color::warning("unborn (no commits yet)"));
            return Ok(());
        }
    };
    let worktree_id = identity::worktree_id(&store)?;
    let branch = identity::shadow_branch_name(head, &worktree_id);
    let tip = store.lookup_ref(&identity::shadow_ref_name(head, &worktree_id))?;
    match tip {
        Some(tip) => {
            let count = store.walk(tip, Some(head))?.len();
            println!(
                "Shadow branch:  {} ({} checkpoint{})",
                color::accent(&branch),
                count,
                if count == 1 { "" } else { "s" }
            );
        }
        None => println!("Shadow branch:  {}", color::muted("none")),
    }

    let records = sessions.list()?;
    let active: Vec<_> = records.iter().filter(|r| r.is_active()).collect();
    println!(
        "Sessions:       {} active, {} total",
        active.len(),
        records.len()
    );
    for record in active {
        println!(
            "  {} {} ({} checkpoint{}, started {})",
            color::accent(&record.session_id),
            record.agent_type,
            record.checkpoint_count,
            if record.checkpoint_count == 1 { "" } else { "s" },
            color::muted(&record.started_at),
        );
    }

    Ok(())
}
