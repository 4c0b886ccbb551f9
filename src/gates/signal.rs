//! Signal gate: hold the run until a named OS signal arrives.
//!
//! The gate has no timeout. It releases on the named signal or on
//! cancellation of the lifecycle context, and reports `Ok` in both cases;
//! callers inspect the context to tell the two apart.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::sync::Arc;

use async_trait::async_trait;
use futures::FutureExt;
use futures::future::BoxFuture;
use log::info;
use nix::sys::signal::Signal;
use tokio::signal::unix::{SignalKind, signal};

use super::Precondition;
use crate::error::GateError;
use crate::lifecycle::LifecycleContext;

/// An OS signal, resolved by name against the platform signal table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NamedSignal(Signal);

impl NamedSignal {
    /// The signal the cancellation source listens to.
    pub const INTERRUPT: NamedSignal = NamedSignal(Signal::SIGINT);

    /// Every signal the platform table knows.
    pub fn all() -> impl Iterator<Item = NamedSignal> {
        Signal::iterator().map(NamedSignal)
    }

    pub fn signal(&self) -> Signal {
        self.0
    }

    /// Signal number as the kernel sees it.
    pub fn raw(&self) -> i32 {
        self.0 as i32
    }
}

impl From<Signal> for NamedSignal {
    fn from(signal: Signal) -> Self {
        NamedSignal(signal)
    }
}

impl fmt::Display for NamedSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl FromStr for NamedSignal {
    type Err = GateError;

    /// Accepts `SIGUSR1`, `USR1`, `sigusr1`, ...
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_ascii_uppercase();
        let full = if upper.starts_with("SIG") {
            upper
        } else {
            format!("SIG{}", upper)
        };
        Signal::from_str(&full)
            .map(NamedSignal)
            .map_err(|_| GateError::UnknownSignal { name: s.to_string() })
    }
}

/// Resolves once the subscribed signal has been delivered.
pub type Subscription = BoxFuture<'static, ()>;

/// Where signal subscriptions come from.
///
/// The subscription is registered when `subscribe` returns, not when the
/// future is first polled.
pub trait SignalSource: Send + Sync {
    fn subscribe(&self, signal: NamedSignal) -> io::Result<Subscription>;
}

/// Process signals delivered through tokio.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSignals;

impl SignalSource for TokioSignals {
    fn subscribe(&self, named: NamedSignal) -> io::Result<Subscription> {
        let mut stream = signal(SignalKind::from_raw(named.raw()))?;
        Ok(async move {
            stream.recv().await;
        }
        .boxed())
    }
}

/// Block until `name` is delivered or `ctx` is cancelled.
///
/// An empty name disables the gate without touching `signals`.
pub async fn wait_for_signal(
    ctx: &LifecycleContext,
    name: &str,
    signals: &dyn SignalSource,
) -> Result<(), GateError> {
    if name.is_empty() {
        return Ok(());
    }

    let signal: NamedSignal = name.parse()?;
    let subscription = signals
        .subscribe(signal)
        .map_err(|source| GateError::SignalSubscription {
            signal: signal.to_string(),
            source,
        })?;

    info!("Waiting for signal {}", signal);
    let scope = ctx.child_token();
    tokio::select! {
        biased;
        _ = scope.cancelled() => info!("Stopped waiting for {}, run cancelled", signal),
        _ = subscription => info!("Received start signal {}", signal),
    }
    Ok(())
}

/// Gate wrapper around [`wait_for_signal`].
pub struct SignalGate {
    name: String,
    signals: Arc<dyn SignalSource>,
}

impl SignalGate {
    pub fn new(name: impl Into<String>, signals: Arc<dyn SignalSource>) -> Self {
        Self {
            name: name.into(),
            signals,
        }
    }
}

#[async_trait]
impl Precondition for SignalGate {
    fn name(&self) -> &str {
        "start-signal"
    }

    async fn wait(&self, ctx: &LifecycleContext) -> Result<(), GateError> {
        wait_for_signal(ctx, &self.name, self.signals.as_ref()).await
    }
}
