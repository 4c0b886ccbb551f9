//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - log: stream the lines of one or more log files
//! - pcap: stream the packets of one or more capture files
//! - version: print the version
//!
//! The run flags are global so both streaming subcommands inherit them.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

use crate::config::duration::parse_duration;

/// Stream - send log lines or captured packets to a network destination
#[derive(Parser, Debug)]
#[command(name = "stream")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub run: RunFlags,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags shared by every streaming subcommand.
///
/// Unset flags fall back to the config file, then to built-in defaults.
#[derive(Args, Debug, Clone, Default)]
pub struct RunFlags {
    /// Destination address
    #[arg(long, global = true)]
    pub addr: Option<String>,

    /// Delay start after start-signal (e.g. 500ms, 2s)
    #[arg(long, global = true, value_parser = parse_duration, allow_hyphen_values = true)]
    pub delay: Option<Duration>,

    /// Protocol (tcp/udp/tls) [default: tcp]
    #[arg(short, long, global = true)]
    pub protocol: Option<String>,

    /// Connection retry attempts for tcp based protocols [default: 10]
    #[arg(long, global = true)]
    pub retry: Option<u32>,

    /// Wait for start signal (e.g. SIGUSR1)
    #[arg(short = 's', long, global = true)]
    pub start_signal: Option<String>,
}

/// Main subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Stream log lines
    Log {
        /// Log files to stream
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Stream packets from pcap files
    Pcap {
        /// Capture files to stream
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Print the version
    Version,
}
