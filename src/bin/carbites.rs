// Copyright 2019-2024 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use carbites::cli::Cli;
use clap::Parser;

fn main() {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    if let Err(e) = cli.command.run() {
        cli_error_and_die(format!("{e:#}"), 1);
    }
}

fn setup_logger(verbosity: u8) {
    let default_directive = match verbosity {
        0 => "carbites=info",
        1 => "carbites=debug",
        _ => "carbites=trace",
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_directive));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Prints an error and exits with the given status code, in the style this
/// lineage's own CLI uses for unrecoverable errors.
fn cli_error_and_die(msg: impl std::fmt::Display, code: i32) -> ! {
    eprintln!("Error: {msg}");
    std::process::exit(code);
}
