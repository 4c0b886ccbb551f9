//! Startup gates - blocking preconditions that must clear before streaming.
//!
//! Each gate races its own release condition against cancellation of the
//! lifecycle context. Outcomes are binary: cleared or a terminal error.

pub mod delay;
pub mod signal;

use async_trait::async_trait;

use crate::error::GateError;
use crate::lifecycle::LifecycleContext;

pub use delay::{DelayGate, wait_for_delay};
pub use signal::{NamedSignal, SignalGate, SignalSource, Subscription, TokioSignals, wait_for_signal};

/// A blocking startup precondition
#[async_trait]
pub trait Precondition: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Wait until the gate clears or fails
    async fn wait(&self, ctx: &LifecycleContext) -> Result<(), GateError>;
}
