use clap::ArgMatches;

use entire_core::condense::metadata;
use entire_core::identity;

use crate::color;
use crate::commands::{open_repo, CommandResult};

pub(crate) fn handle_explain_command(matches: &ArgMatches) -> CommandResult {
    let (store, _sessions) = open_repo()?;
    let id = matches
        .get_one::<String>("id")
        .ok_or("Checkpoint id is required")?;

    let Some((info, prompt)) = metadata::load_checkpoint(&store, id)? else {
        eprintln!("Checkpoint '{}' not found on {}", id, identity::METADATA_BRANCH);
        return Err("checkpoint not found".into());
    };

    println!("{} {}", color::bold("Checkpoint"), color::accent(&info.checkpoint_id));
    println!("  strategy:    {}", info.strategy);
    println!("  base commit: {}", &info.base_commit[..7.min(info.base_commit.len())]);
    println!("  created at:  {}", info.created_at);
    match info.all_session_ids().as_slice() {
        [single] => println!("  session:     {}", single),
        many => {
            println!("  sessions:    {} (newest first)", many.len());
            for session in many {
                println!("    - {}", session);
            }
        }
    }
    println!("  files touched:");
    for file in &info.files_touched {
        println!("    - {}", file);
    }
    if let Some(prompt) = prompt {
        println!();
        println!("{}", color::bold("First prompt:"));
        for line in prompt.lines() {
            println!("  {}", color::muted(line));
        }
    }
    if info.is_logs_only {
        println!();
        println!(
            "{}",
            color::muted("Logs-only: the full tree was retired at condensation; transcript and metadata remain.")
        );
    }
    Ok(())
}
