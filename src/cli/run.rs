//! CLI entry point and command dispatch

use bddap_utils::error::BddapError;
use bddap_utils::exit_codes::ExitCode;
use bddap_utils::logging::init_tracing;
use clap::Parser;

use super::args::{Cli, Commands};
use super::commands;

/// Parse arguments, run the command and print any error for the user.
///
/// # Errors
///
/// Returns the exit code the process should terminate with.
pub fn run() -> Result<(), ExitCode> {
    let cli = Cli::parse();

    if let Err(e) = init_tracing(cli.verbose) {
        eprintln!("Warning: failed to initialise logging: {e}");
    }

    let result: Result<(), BddapError> = match &cli.command {
        Commands::Parse { paths, json } => commands::parse(paths, *json),
        Commands::Find {
            name,
            category,
            paths,
            json,
        } => commands::find(paths, name, (*category).into(), *json),
        Commands::Config { json } => commands::config(&cli.config_args(), *json),
    };

    result.map_err(|err| {
        eprintln!("{}", err.display_for_user());
        err.to_exit_code()
    })
}
