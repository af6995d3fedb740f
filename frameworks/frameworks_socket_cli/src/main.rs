//! Socket Demo Binary Entry Point
//!
//! Parses the command line, installs the logger and runs one subcommand.

use std::io::{self, Write};
use std::process;

use clap::Parser;

use frameworks_socket_cli::{run, SocketCliArgs};

fn main() {
    let args = SocketCliArgs::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(args.default_log_filter()))
        .format_timestamp_millis()
        .init();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(e) = run(&args.command, &mut out) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
    if let Err(e) = out.flush() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
