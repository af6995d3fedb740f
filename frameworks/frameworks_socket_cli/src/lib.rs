//! Frameworks Layer: Socket Demo CLI
//!
//! Command line front end exercising the library the way a small
//! application would: a one-shot TCP or UDP server that answers a single
//! message, matching clients, hostname resolution and interface listing.
//!
//! ## Modules
//!
//! - [`args`]: clap argument definitions
//! - [`commands`]: the subcommands, writing their report to any `Write`

pub mod args;
pub mod commands;

pub use args::{Command, FamilyArg, SocketCliArgs};
pub use commands::{run, CliError};
