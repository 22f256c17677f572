use clap::ArgMatches;

use entire_core::sessions::SessionStore;
use entire_git::ObjectStore;

mod clean;
mod debug;
mod disable;
mod enable;
mod explain;
mod hook;
mod hooks;
mod reset;
mod resume;
mod rewind;
mod sessions;
mod status;
mod version;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Open the repository containing the current directory, with a friendly
/// message when there isn't one.
pub(crate) fn open_repo() -> Result<(ObjectStore, SessionStore), Box<dyn std::error::Error>> {
    let cwd = std::env::current_dir()?;
    let store = ObjectStore::open(&cwd).map_err(|_| {
        eprintln!("Not in a git repository. Run entire inside the repository you want to checkpoint.");
        "not a repository"
    })?;
    let sessions = SessionStore::for_repo(&store);
    Ok((store, sessions))
}

pub fn run_command(matches: &ArgMatches) -> CommandResult {
    match matches.subcommand() {
        Some(("enable", sub)) => enable::handle_enable_command(sub),
        Some(("disable", sub)) => disable::handle_disable_command(sub),
        Some(("status", sub)) => status::handle_status_command(sub),
        Some(("hooks", sub)) => hooks::handle_hooks_command(sub),
        Some(("sessions", sub)) => sessions::handle_sessions_command(sub),
        Some(("reset", sub)) => reset::handle_reset_command(sub),
        Some(("rewind", sub)) => rewind::handle_rewind_command(sub),
        Some(("resume", sub)) => resume::handle_resume_command(sub),
        Some(("explain", sub)) => explain::handle_explain_command(sub),
        Some(("clean", sub)) => clean::handle_clean_command(sub),
        Some(("hook", sub)) => hook::handle_hook_command(sub),
        Some(("version", sub)) => version::handle_version_command(sub),
        Some(("debug", sub)) => debug::handle_debug_command(sub),
        _ => {
            eprintln!("Unknown command. See entire --help.");
            Err("unknown command".into())
        }
    }
}
