use clap::ArgMatches;
use tracing::info;

use entire_core::rewind;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_clean_command(_matches: &ArgMatches) -> CommandResult {
    let (store, sessions) = open_repo()?;

    let report = rewind::clean(&store, &sessions).map_err(|e| {
        eprintln!("{}", e);
        e
    })?;

    if report.branches_deleted.is_empty() && report.records_deleted.is_empty() {
        println!("Nothing to clean.");
        return Ok(());
    }
    for branch in &report.branches_deleted {
        println!("  {} Deleted orphan branch {}", color::success("✓"), branch);
    }
    for record in &report.records_deleted {
        println!("  {} Deleted stale session {}", color::success("✓"), record);
    }
    info!(
        event = "cli.clean_completed",
        branches = report.branches_deleted.len(),
        records = report.records_deleted.len(),
    );
    Ok(())
}
