use clap::ArgMatches;
use tracing::info;

use entire_core::rewind;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_rewind_command(matches: &ArgMatches) -> CommandResult {
    let (store, sessions) = open_repo()?;
    let id = matches
        .get_one::<String>("id")
        .ok_or("Rewind target id is required")?;

    let report = rewind::rewind(&store, &sessions, id).map_err(|e| {
        eprintln!("{}", e);
        e
    })?;

    println!(
        "  {} Restored {} file(s), deleted {} file(s)",
        color::success("✓"),
        report.restored_files,
        report.deleted_files
    );
    if report.session_cleared {
        println!("  {} Rewound past the session start; session cleared", color::success("✓"));
    } else {
        println!(
            "  {} Shadow branch truncated to {} checkpoint(s)",
            color::success("✓"),
            report.checkpoint_count
        );
    }

    info!(event = "cli.rewind_completed", target = %id);
    Ok(())
}
