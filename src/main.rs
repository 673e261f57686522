//! Spritecheck - command-line verifier for sprite and portrait submissions

use clap::Parser;
use std::process::ExitCode;

use spritecheck::cli::{self, Cli};

fn main() -> ExitCode {
    let args = Cli::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();
    cli::run(args)
}
