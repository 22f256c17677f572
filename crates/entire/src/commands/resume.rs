use clap::ArgMatches;

use entire_core::identity;
use entire_core::shadow::engine::find_session_by_raw_id;
use entire_core::transcripts;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_resume_command(matches: &ArgMatches) -> CommandResult {
    let (_store, sessions) = open_repo()?;
    let id = matches
        .get_one::<String>("id")
        .ok_or("Session id is required")?;

    let record = match sessions.load(id)? {
        Some(record) => Some(record),
        None => find_session_by_raw_id(&sessions, id)?,
    };
    let Some(record) = record else {
        eprintln!("Session '{}' not found. See entire sessions.", id);
        return Err("session not found".into());
    };

    let raw = identity::extract_agent_session_id(&record.session_id);
    let Some(adapter) = transcripts::adapter_for(record.agent_type) else {
        eprintln!("No adapter for agent '{}'.", record.agent_type);
        return Err("no adapter".into());
    };
    let command = adapter.format_resume_command(raw);

    println!(
        "Resume session {} ({} checkpoint{}):",
        color::bold(&record.session_id),
        record.checkpoint_count,
        if record.checkpoint_count == 1 { "" } else { "s" },
    );
    println!();
    println!("  {}", color::accent(&command));
    Ok(())
}
