//! Resolved run options shared by every streaming subcommand.

use eyre::{Result, eyre};
use std::time::Duration;

use super::FileConfig;
use super::duration::parse_duration;
use crate::cli::RunFlags;

/// Protocol used when neither flag nor config file names one.
pub const DEFAULT_PROTOCOL: &str = "tcp";

/// Retry attempts used when neither flag nor config file sets them.
pub const DEFAULT_RETRIES: u32 = 10;

/// Immutable options for one invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    /// Destination address (`host:port`).
    pub addr: String,
    /// Name of the registered output to use.
    pub protocol: String,
    /// Start delay; zero disables the delay gate.
    pub delay: Duration,
    /// Signal to wait for; empty disables the signal gate.
    pub start_signal: String,
    /// Passed through to the output untouched.
    pub retries: u32,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            addr: String::new(),
            protocol: DEFAULT_PROTOCOL.to_string(),
            delay: Duration::ZERO,
            start_signal: String::new(),
            retries: DEFAULT_RETRIES,
        }
    }
}

impl RunOptions {
    /// Merge flags over the config file over the defaults.
    pub fn resolve(flags: &RunFlags, file: &FileConfig) -> Result<Self> {
        let defaults = Self::default();

        let delay = match (flags.delay, file.delay.as_deref()) {
            (Some(delay), _) => delay,
            (None, Some(raw)) => parse_duration(raw).map_err(|e| eyre!("config file delay: {}", e))?,
            (None, None) => defaults.delay,
        };

        Ok(Self {
            addr: flags.addr.clone().or_else(|| file.addr.clone()).unwrap_or(defaults.addr),
            protocol: flags
                .protocol
                .clone()
                .or_else(|| file.protocol.clone())
                .unwrap_or(defaults.protocol),
            delay,
            start_signal: flags
                .start_signal
                .clone()
                .or_else(|| file.start_signal.clone())
                .unwrap_or(defaults.start_signal),
            retries: flags.retry.or(file.retry).unwrap_or(defaults.retries),
        })
    }

    /// Builder-style helper used by tests and embedders.
    pub fn with_protocol(mut self, protocol: impl Into<String>) -> Self {
        self.protocol = protocol.into();
        self
    }

    pub fn with_addr(mut self, addr: impl Into<String>) -> Self {
        self.addr = addr.into();
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_start_signal(mut self, signal: impl Into<String>) -> Self {
        self.start_signal = signal.into();
        self
    }
}
