use clap::{Arg, ArgAction, Command};

pub fn root_command() -> Command {
    Command::new("entire")
        .about("Silent checkpoints for AI coding sessions")
        .long_about(
            "Records every state an AI coding agent passes through on hidden \
             shadow branches, then condenses them into durable checkpoints \
             attached to your commits. Rewind, explain, or reset any agent \
             session without touching your history.",
        )
        .subcommand_required(true)
        .arg_required_else_help(true)
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .help("Emit info-level JSON logs to stderr")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .arg(
            Arg::new("no-color")
                .long("no-color")
                .help("Disable colored output")
                .action(ArgAction::SetTrue)
                .global(true),
        )
}
