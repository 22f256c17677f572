use clap::{Arg, Command};

/// The hook entry points. Agent subcommands read a JSON event from stdin
/// and may answer with a JSON object on stdout; git subcommands take
/// their arguments from git. All of them exit 0 no matter what.
pub fn hook_command() -> Command {
    Command::new("hook")
        .about("Hook entry points (invoked by agents and git, not by hand)")
        .hide(true)
        .subcommand_required(true)
        .subcommand(Command::new("claude").about("Handle a Claude Code hook event from stdin"))
        .subcommand(Command::new("gemini").about("Handle a Gemini CLI hook event from stdin"))
        .subcommand(
            Command::new("prepare-commit-msg")
                .about("Insert or restore the checkpoint trailer")
                .arg(Arg::new("msg-file").value_name("FILE").required(true))
                .arg(Arg::new("source").value_name("SOURCE"))
                .arg(Arg::new("sha").value_name("SHA")),
        )
        .subcommand(Command::new("post-commit").about("Condense the shadow branch"))
}
