//! Error types for stream
//!
//! Centralized error handling using thiserror. Gate failures are collected
//! into [`StartupErrors`] so one report names every failed precondition.

use std::fmt;
use std::time::Duration;

use thiserror::Error;

/// The lifecycle context was cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("lifecycle context cancelled")]
pub struct Cancelled;

/// Terminal failure of a single startup gate.
#[derive(Debug, Error)]
pub enum GateError {
    /// `--start-signal` does not name a signal we can subscribe to
    #[error("unknown signal {name}")]
    UnknownSignal { name: String },

    /// The OS refused the subscription for a known signal
    #[error("failed to subscribe to {signal}: {source}")]
    SignalSubscription {
        signal: String,
        #[source]
        source: std::io::Error,
    },

    /// The delay was cut short by shutdown
    #[error("delay waiting period was interrupted after {elapsed:?} of {delay:?}: {source}")]
    InterruptedWait {
        delay: Duration,
        elapsed: Duration,
        #[source]
        source: Cancelled,
    },
}

/// Every error produced by one run of the startup gates, in insertion order.
///
/// Empty means startup succeeded.
#[derive(Debug, Default)]
pub struct StartupErrors {
    errors: Vec<GateError>,
}

impl StartupErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, error: GateError) {
        self.errors.push(error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GateError> {
        self.errors.iter()
    }

    /// `Ok(())` when no gate failed, otherwise the whole collection.
    pub fn into_result(self) -> std::result::Result<(), StartupErrors> {
        if self.is_empty() { Ok(()) } else { Err(self) }
    }
}

impl fmt::Display for StartupErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ");
        write!(f, "{}", joined)
    }
}

impl std::error::Error for StartupErrors {}

impl From<GateError> for StartupErrors {
    fn from(error: GateError) -> Self {
        Self { errors: vec![error] }
    }
}

/// All error types that can occur in stream
#[derive(Debug, Error)]
pub enum StreamError {
    /// One or more startup preconditions failed
    #[error("startup aborted: {0}")]
    Startup(#[from] StartupErrors),

    /// `--protocol` names no registered output
    #[error("unknown protocol {name:?} (registered: {registered})")]
    UnknownProtocol { name: String, registered: String },

    /// The run was cancelled before streaming started
    #[error("interrupted before streaming started")]
    Interrupted,

    /// Invalid option value or config file
    #[error("Config error: {0}")]
    Config(String),

    /// Output sink failure, passed through unchanged
    #[error("{protocol} output error: {message}")]
    Output { protocol: String, message: String },

    /// Capture file could not be read
    #[error("pcap error: {0}")]
    Pcap(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub fn output(protocol: &str, message: impl fmt::Display) -> Self {
        StreamError::Output {
            protocol: protocol.to_string(),
            message: message.to_string(),
        }
    }
}

/// Result type alias for stream operations
pub type Result<T> = std::result::Result<T, StreamError>;
