//! CLI module for stream - command-line interface and subcommands.
//!
//! Provides the main entry point with the log, pcap and version subcommands.

pub mod commands;

pub use commands::{Cli, Commands, RunFlags};
