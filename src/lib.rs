//! stream - send log lines or captured packets to a network destination
//!
//! The core is startup orchestration: one interrupt-driven lifecycle context,
//! a signal gate and a delay gate composed into a validate-all startup
//! sequence, and a dispatcher that only hands control to the selected output
//! once every gate has cleared.

pub mod cli;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod gates;
pub mod lifecycle;
pub mod output;
pub mod runner;
pub mod startup;

pub use error::{GateError, Result, StartupErrors, StreamError};
