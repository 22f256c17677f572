use clap::ArgMatches;

use crate::commands::CommandResult;

pub(crate) fn handle_version_command(_matches: &ArgMatches) -> CommandResult {
    println!("entire {}", env!("CARGO_PKG_VERSION"));
    Ok(())
}
