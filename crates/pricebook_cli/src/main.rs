mod cli;
mod commands;
mod error;
mod output;

use clap::Parser;

use crate::cli::Cli;
use crate::error::CliError;

fn main() {
    let cli = Cli::parse();
    if let Err(error) = run(&cli) {
        output::render_error(&error);
        std::process::exit(error.exit_code());
    }
}

fn run(cli: &Cli) -> Result<(), CliError> {
    init_logging(cli)?;
    let data = commands::run(cli)?;
    output::render(&data, cli.pretty)
}

fn init_logging(cli: &Cli) -> Result<(), CliError> {
    let Some(log_dir) = cli.log_dir.as_ref() else {
        return Ok(());
    };

    let log_dir = if log_dir.is_absolute() {
        log_dir.clone()
    } else {
        std::env::current_dir()?.join(log_dir)
    };
    let level = cli
        .log_level
        .as_deref()
        .unwrap_or_else(|| pricebook_core::default_log_level());

    pricebook_core::init_logging(level, &log_dir.to_string_lossy()).map_err(CliError::Logging)
}
