use clap::{Arg, Command};

pub fn enable_command() -> Command {
    Command::new("enable")
        .about("Install the git hooks and agent hooks for this repository")
        .arg(
            Arg::new("agent")
                .long("agent")
                .value_name("AGENT")
                .help("Agent family to wire up (claude, gemini); defaults to the configured agent"),
        )
}

pub fn disable_command() -> Command {
    Command::new("disable").about("Remove the git hooks installed by enable")
}

pub fn status_command() -> Command {
    Command::new("status").about("Show checkpointing status for this worktree")
}

pub fn hooks_command() -> Command {
    Command::new("hooks")
        .about("Manage agent settings-file hooks")
        .arg(
            Arg::new("agent")
                .value_name("AGENT")
                .required(true)
                .help("Agent family (claude, gemini)"),
        )
        .arg(
            Arg::new("verb")
                .value_name("VERB")
                .required(true)
                .value_parser(["install", "uninstall", "status"])
                .help("What to do with the agent's hooks"),
        )
}

pub fn version_command() -> Command {
    Command::new("version").about("Print the entire version")
}

pub fn debug_command() -> Command {
    Command::new("debug").about("Dump engine state for this worktree as JSON")
}
