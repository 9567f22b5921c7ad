// fieldguard/src/main.rs
//! FieldGuard CLI entry point.
//!
//! Parses arguments, sets up logging and hands off to the command runners.

use anyhow::Result;
use clap::Parser;
use log::info;
use std::io;

use fieldguard::cli::{Cli, Commands, PatternsCommand, PolicyCommand};
use fieldguard::commands::{mask, patterns, policy, scan};
use fieldguard::logger;

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    logger::init_logger(logger::level_for(args.quiet, args.debug));
    info!("fieldguard started. Version: {}", env!("CARGO_PKG_VERSION"));

    match &args.command {
        Commands::Scan(cmd) => scan::run_scan(cmd).await?,
        Commands::Mask(cmd) => println!("{}", mask::run_mask(cmd)?),
        Commands::Patterns(PatternsCommand::Check { path, json }) => {
            patterns::run_check(path, *json, &mut io::stdout().lock())?
        }
        Commands::Policy(PolicyCommand::Sign { path, key_hex }) => {
            println!("{}", policy::run_sign(path, key_hex)?)
        }
        Commands::Policy(PolicyCommand::Verify { path, key_hex }) => {
            println!("{}", policy::run_verify(path, key_hex)?)
        }
    }
    Ok(())
}
