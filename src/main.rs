//! handoff - CLI entry point.

use std::env;
use std::io::BufRead;

use clap::Parser;
use clap::error::ErrorKind;
use eyre::{Context, Result};
use log::info;

use handoff::Coordinator;
use handoff::cli::{Cli, debug_flag_misplaced, normalize_args};
use handoff::input;

fn setup_logging() {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Warn)
        .init();
}

fn main() -> Result<()> {
    setup_logging();

    let args = normalize_args(env::args());
    if debug_flag_misplaced(&args[1..]) {
        eprintln!("error: the debug flag must come before or after the positional arguments");
        std::process::exit(1);
    }

    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            let _ = err.print();
            return Ok(());
        }
        Err(err) => {
            // Malformed invocation exits 1, before any threads are spawned.
            let _ = err.print();
            std::process::exit(1);
        }
    };

    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("failed to read input line")?;
    let values = input::parse_line(&line);
    info!("parsed {} values from input", values.len());

    let coordinator = Coordinator::new(cli.workers, cli.max_pause_ms, cli.debug, cli.disrupt);
    let total = coordinator.run(values)?;
    println!("{total}");
    Ok(())
}
