use clap::ArgMatches;
use tracing::info;

use entire_core::rewind;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_reset_command(matches: &ArgMatches) -> CommandResult {
    let (store, sessions) = open_repo()?;
    let force = matches.get_flag("force");

    if let Some(id) = matches.get_one::<String>("session") {
        rewind::reset_session(&sessions, id).map_err(|e| {
            eprintln!("{}", e);
            e
        })?;
        println!("  {} Cleared session {}", color::success("✓"), id);
        return Ok(());
    }

    // Uncondensed checkpoints would be lost; ask for --force first.
    if !force {
        let head = store.head()?;
        let pending: u32 = sessions
            .list()?
            .iter()
            .filter(|r| r.is_active() && r.base_commit == head.to_string())
            .map(|r| r.checkpoint_count)
            .sum();
        if pending > 0 {
            eprintln!(
                "{} uncondensed checkpoint(s) would be discarded. Re-run with --force to proceed.",
                pending
            );
            return Err("refusing reset without --force".into());
        }
    }

    let report = rewind::reset(&store, &sessions).map_err(|e| {
        eprintln!("{}", e);
        e
    })?;

    if report.branch_deleted {
        println!("  {} Deleted shadow branch", color::success("✓"));
    }
    println!(
        "  {} Cleared {} session record(s)",
        color::success("✓"),
        report.sessions_cleared
    );
    info!(event = "cli.reset_completed", cleared = report.sessions_cleared);
    Ok(())
}
