use std::io::Write;

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use tracing_subscriber::EnvFilter;
use water::Cli;

/// Environment variable holding `tracing` filter directives.
const LOG_ENV: &str = "WATER_LOG";

fn main() {
    let exit_code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            1
        }
    };

    std::process::exit(exit_code);
}

fn run() -> Result<i32> {
    let cli = match Cli::try_parse_args(std::env::args_os()) {
        Ok(cli) => cli,
        Err(err) => return usage_error(err),
    };
    init_tracing(cli.verbose)?;

    if cli.version {
        println!("{}", water::version_line());
        return Ok(0);
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    let result = water::run(&cli.options(), &mut out);
    out.flush().context("failed to flush standard output")?;
    match result {
        Ok(_) => Ok(0),
        Err(err) => {
            eprintln!("{}", err);
            Ok(err.exit_code())
        }
    }
}

fn usage_error(err: clap::Error) -> Result<i32> {
    match err.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
            err.print().context("failed to print help")?;
            Ok(0)
        }
        _ => {
            eprint!("Invalid Parameters: {}", err.render());
            Ok(1)
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let default = if verbose { "debug" } else { "warn" };
    let filter = match std::env::var(LOG_ENV) {
        Ok(directives) if !directives.trim().is_empty() => EnvFilter::try_new(directives.trim())
            .with_context(|| format!("invalid {} directives", LOG_ENV))?,
        _ => EnvFilter::new(default),
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err))
        .context("failed to initialise logging")
}
