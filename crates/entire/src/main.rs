use entire_core::init_logging;

mod app;
mod color;
mod commands;

fn main() {
    let app = app::build_cli();
    let matches = app.get_matches();

    if matches.get_flag("no-color") {
        color::set_no_color();
    }

    let verbose = matches.get_flag("verbose");
    // Hook subcommands must keep stderr quiet unless asked; everything
    // else defaults to info-level JSON logs only with --verbose.
    init_logging(!verbose);

    if let Err(e) = commands::run_command(&matches) {
        // Error already printed to the user via eprintln! in the handlers.
        drop(e);
        std::process::exit(1);
    }
}
