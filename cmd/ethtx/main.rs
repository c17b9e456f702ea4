//! ethtx - build, sign, decode and verify Ethereum transactions from the command line.

mod cli;

use clap::Parser;
use tracing_subscriber::{EnvFilter, filter::Directive, fmt, prelude::*};

use crate::cli::CLI;

fn main() -> eyre::Result<()> {
    let CLI { opts, command } = CLI::parse();

    let log_filter = EnvFilter::builder()
        .with_default_directive(Directive::from(opts.log_level))
        .from_env_lossy();
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(log_filter)
        .init();

    command.run()
}
