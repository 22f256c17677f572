use clap::{Arg, ArgAction, Command};

pub fn sessions_command() -> Command {
    Command::new("sessions").about("List session records for this worktree")
}

pub fn reset_command() -> Command {
    Command::new("reset")
        .about("Discard the shadow branch for the current commit and clear its sessions")
        .arg(
            Arg::new("force")
                .long("force")
                .help("Discard even when sessions still hold uncondensed checkpoints")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("session")
                .long("session")
                .value_name("ID")
                .help("Clear only this session record (raw or dated id)"),
        )
}

pub fn rewind_command() -> Command {
    Command::new("rewind")
        .about("Restore the working tree to a prior checkpoint")
        .arg(
            Arg::new("id")
                .value_name("ID")
                .required(true)
                .help("Shadow commit id from `entire sessions`, or the base commit for a full unwind"),
        )
}

pub fn resume_command() -> Command {
    Command::new("resume")
        .about("Print the agent command that resumes a recorded session")
        .arg(
            Arg::new("id")
                .value_name("SESSION")
                .required(true)
                .help("Session id (raw or dated) from `entire sessions`"),
        )
}

pub fn explain_command() -> Command {
    Command::new("explain")
        .about("Show what a condensed checkpoint recorded")
        .arg(
            Arg::new("id")
                .value_name("CHECKPOINT")
                .required(true)
                .help("12-hex checkpoint id from a commit's Entire-Checkpoint trailer"),
        )
}

pub fn clean_command() -> Command {
    Command::new("clean")
        .about("Delete orphaned shadow branches and stale session records")
}
