//! Lifecycle management.
//!
//! # Data Flow
//! ```text
//! CancellationSource::install()
//!     SIGINT → cancel root context (once)
//!
//! root.child_token() → gates, output, subcommand body
//! ```
//!
//! A [`LifecycleContext`] is only ever read by its consumers. Only the
//! cancellation source cancels the root.

pub mod cancellation;

pub use cancellation::CancellationSource;

/// The cancellable execution scope shared by the whole run.
pub type LifecycleContext = tokio_util::sync::CancellationToken;
