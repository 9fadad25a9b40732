//! envlaunch CLI library: argument parsing, config assembly and command dispatch.

mod cli;
mod commands;
mod console;

use clap::Parser;
use cli::{Cli, Commands};
use envlaunch_core::{config, observability};

/// Run the CLI and return the process exit code.
///
/// Launch failures are mapped to their exit codes by the commands; an
/// unexpected error (writing output, serializing a report) exits with 1.
pub fn run_cli() -> i32 {
    config::load_dotenv();
    let cli = Cli::parse();
    observability::init_tracing();

    let result = match cli.command {
        None => Ok(commands::run::cmd_run(&cli.launch)),
        Some(Commands::Run(args)) => Ok(commands::run::cmd_run(&args)),
        Some(Commands::Check { launch, json }) => commands::check::cmd_check(&launch, json),
        Some(Commands::Envs { source, json }) => commands::envs::cmd_envs(&source, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("envlaunch: {:#}", e);
            1
        }
    }
}
