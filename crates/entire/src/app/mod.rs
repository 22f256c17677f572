mod global;
mod hook;
mod session;
mod setup;

use clap::Command;

pub fn build_cli() -> Command {
    global::root_command()
        .subcommand(setup::enable_command())
        .subcommand(setup::disable_command())
        .subcommand(setup::status_command())
        .subcommand(setup::hooks_command())
        .subcommand(session::sessions_command())
        .subcommand(session::reset_command())
        .subcommand(session::rewind_command())
        .subcommand(session::resume_command())
        .subcommand(session::explain_command())
        .subcommand(session::clean_command())
        .subcommand(hook::hook_command())
        .subcommand(setup::version_command())
        .subcommand(setup::debug_command())
}
