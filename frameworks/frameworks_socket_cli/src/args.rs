//! Command-Line Argument Parsing Module
//!
//! Uses clap derive for the subcommands and their options.

use std::time::Duration;

use clap::{Parser, Subcommand, ValueEnum};

use entities_socket_types::AddressFamily;

/// Port the demo programs meet on
pub const DEFAULT_PORT: u16 = 1212;

/// Socket demo command-line arguments
#[derive(Parser, Debug)]
#[command(name = "tinysock")]
#[command(about = "Cross-platform socket demos")]
pub struct SocketCliArgs {
    /// Log at debug level (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl SocketCliArgs {
    /// Log filter used when RUST_LOG is not set
    pub fn default_log_filter(&self) -> &'static str {
        if self.verbose {
            "debug"
        } else {
            "warn"
        }
    }
}

/// Demo subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Accept one TCP client, print its message and reply
    TcpServer {
        /// Host name or address to listen on
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Port to listen on
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Connect over TCP, send a message and print the reply
    TcpClient {
        /// Server host name or address
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Server port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Message to send
        #[arg(long, default_value = "hello world\n")]
        message: String,
        /// Connect timeout in milliseconds
        #[arg(long)]
        timeout_ms: Option<u64>,
        /// Resolver family
        #[arg(long, value_enum, default_value_t = FamilyArg::Any)]
        family: FamilyArg,
    },
    /// Receive one UDP datagram, print it and reply to its sender
    UdpServer {
        /// Host name or address to bind
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Port to bind
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
    },
    /// Send one UDP datagram and print the reply
    UdpClient {
        /// Server host name or address
        #[arg(long, default_value = "localhost")]
        host: String,
        /// Server port
        #[arg(long, default_value_t = DEFAULT_PORT)]
        port: u16,
        /// Message to send
        #[arg(long, default_value = "hello world\n")]
        message: String,
    },
    /// Print the addresses a host name resolves to
    Resolve {
        /// Host name or numeric address
        hostname: String,
        /// Restrict to one family
        #[arg(long, value_enum, default_value_t = FamilyArg::Any)]
        family: FamilyArg,
    },
    /// Print the addresses of local interfaces
    Interfaces,
}

impl Command {
    /// Connect timeout of a TCP client command
    pub fn connect_timeout(&self) -> Option<Duration> {
        match self {
            Command::TcpClient { timeout_ms: Some(ms), .. } => Some(Duration::from_millis(*ms)),
            _ => None,
        }
    }
}

/// Address family selector on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum FamilyArg {
    /// Any family
    Any,
    /// IPv4 only
    Ipv4,
    /// IPv6 only
    Ipv6,
}

impl From<FamilyArg> for AddressFamily {
    fn from(family: FamilyArg) -> Self {
        match family {
            FamilyArg::Any => AddressFamily::Any,
            FamilyArg::Ipv4 => AddressFamily::Ipv4,
            FamilyArg::Ipv6 => AddressFamily::Ipv6,
        }
    }
}
