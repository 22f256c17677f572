use clap::ArgMatches;
use tracing::info;

use entire_core::config;
use entire_core::hooks::install;
use entire_core::transcripts::types::AgentType;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_enable_command(matches: &ArgMatches) -> CommandResult {
    let (store, _sessions) = open_repo()?;
    let worktree = store.workdir()?;
    let loaded = config::load_hierarchy(&worktree);

    let agent_name = matches
        .get_one::<String>("agent")
        .cloned()
        .unwrap_or(loaded.agent.clone());
    let agent: AgentType = agent_name.parse().map_err(|e: String| {
        eprintln!("{}", e);
        e
    })?;

    info!(event = "cli.enable_started", agent = %agent);

    install::install_git_hooks(&store).map_err(|e| {
        eprintln!("Failed to install git hooks: {}", e);
        e
    })?;
    println!(
        "  {} Installed .git/hooks/prepare-commit-msg and post-commit",
        color::success("✓")
    );

    let settings_path = install::install_agent_hooks(agent, &worktree).map_err(|e| {
        eprintln!("Failed to patch agent settings: {}", e);
        e
    })?;
    println!(
        "  {} Configured {}",
        color::success("✓"),
        settings_path.display()
    );

    // Pin the strategy in the repo config so every hook process agrees.
    let config_path = config::repo_config_path(&worktree);
    if !config_path.exists() {
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(
            &config_path,
            format!(
                "strategy = \"{}\"\nagent = \"{}\"\n",
                loaded.strategy,
                agent.as_str()
            ),
        )?;
        println!(
            "  {} Wrote {}",
            color::success("✓"),
            config_path.display()
        );
    }

    println!();
    println!(
        "Checkpointing enabled. {} sessions will be recorded silently;",
        color::bold(agent.as_str())
    );
    println!("your commits gain an Entire-Checkpoint trailer when agent work lands.");

    info!(event = "cli.enable_completed", agent = %agent);
    Ok(())
}
