use clap::ArgMatches;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_sessions_command(_matches: &ArgMatches) -> CommandResult {
    let (_store, sessions) = open_repo()?;

    let mut records = sessions.list()?;
    if records.is_empty() {
        println!("No session records.");
        return Ok(());
    }
    records.sort_by(|a, b| b.started_at.cmp(&a.started_at));

    for record in records {
        let phase = format!("{:?}", record.phase);
        let last = if record.last_checkpoint_id.is_empty() {
            color::muted("-")
        } else {
            color::accent(&record.last_checkpoint_id)
        };
        println!(
            "{}  {:<9} {:<17} base {}  checkpoints {}  last {}",
            color::bold(&record.session_id),
            record.agent_type.to_string(),
            phase,
            color::muted(&record.base_commit[..7.min(record.base_commit.len())]),
            record.checkpoint_count,
            last,
        );
    }
    Ok(())
}
