//! Startup sequencer - runs every precondition and collects every failure.
//!
//! Startup is validate-all: a failing gate never stops the next one from
//! running, so one report names every misconfiguration. Streaming after
//! startup is fail-fast.

use std::sync::Arc;

use log::{debug, warn};

use crate::config::RunOptions;
use crate::error::StartupErrors;
use crate::gates::{DelayGate, Precondition, SignalGate, SignalSource};
use crate::lifecycle::LifecycleContext;

/// An ordered list of preconditions run against one lifecycle context.
pub struct StartupSequencer {
    gates: Vec<Box<dyn Precondition>>,
}

impl StartupSequencer {
    /// Create a new empty sequencer
    pub fn new() -> Self {
        Self { gates: Vec::new() }
    }

    /// The standard sequence: signal gate, then delay gate.
    pub fn standard(options: &RunOptions, signals: Arc<dyn SignalSource>) -> Self {
        Self::new()
            .with_gate(SignalGate::new(options.start_signal.clone(), signals))
            .with_gate(DelayGate::new(options.delay))
    }

    /// Add a gate to the end of the sequence (builder pattern)
    pub fn with_gate(mut self, gate: impl Precondition + 'static) -> Self {
        self.gates.push(Box::new(gate));
        self
    }

    pub fn len(&self) -> usize {
        self.gates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    pub fn gate_names(&self) -> Vec<&str> {
        self.gates.iter().map(|g| g.name()).collect()
    }

    /// Run every gate in order; never stops early.
    pub async fn run(&self, ctx: &LifecycleContext) -> StartupErrors {
        let mut errors = StartupErrors::new();
        for gate in &self.gates {
            debug!("Running startup gate {}", gate.name());
            if let Err(e) = gate.wait(ctx).await {
                warn!("Startup gate {} failed: {}", gate.name(), e);
                errors.push(e);
            }
        }
        errors
    }
}

impl Default for StartupSequencer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the signal and delay gates for `options`.
pub async fn run_preconditions(
    ctx: &LifecycleContext,
    options: &RunOptions,
    signals: Arc<dyn SignalSource>,
) -> StartupErrors {
    StartupSequencer::standard(options, signals).run(ctx).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GateError;
    use crate::gates::{NamedSignal, Subscription};
    use async_trait::async_trait;
    use futures::FutureExt;
    use std::io;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::time::Instant;

    struct NeverSignals;

    impl SignalSource for NeverSignals {
        fn subscribe(&self, _signal: NamedSignal) -> io::Result<Subscription> {
            Ok(futures::future::pending::<()>().boxed())
        }
    }

    struct CountingGate {
        label: &'static str,
        fail: bool,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Precondition for CountingGate {
        fn name(&self) -> &str {
            self.label
        }

        async fn wait(&self, _ctx: &LifecycleContext) -> Result<(), GateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(GateError::UnknownSignal {
                    name: self.label.to_string(),
                })
            } else {
                Ok(())
            }
        }
    }

    #[test]
    fn test_standard_sequence_order() {
        let sequencer = StartupSequencer::standard(&RunOptions::default(), Arc::new(NeverSignals));
        assert_eq!(sequencer.gate_names(), vec!["start-signal", "delay"]);
        assert_eq!(sequencer.len(), 2);
    }

    #[tokio::test]
    async fn test_empty_sequencer_clears() {
        let sequencer = StartupSequencer::new();
        assert!(sequencer.is_empty());
        assert!(sequencer.run(&LifecycleContext::new()).await.is_empty());
    }

    #[tokio::test]
    async fn test_failure_does_not_stop_later_gates() {
        let calls = Arc::new(AtomicUsize::new(0));
        let sequencer = StartupSequencer::new()
            .with_gate(CountingGate {
                label: "first",
                fail: true,
                calls: calls.clone(),
            })
            .with_gate(CountingGate {
                label: "second",
                fail: false,
                calls: calls.clone(),
            })
            .with_gate(CountingGate {
                label: "third",
                fail: true,
                calls: calls.clone(),
            });

        let errors = sequencer.run(&LifecycleContext::new()).await;

        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert_eq!(errors.len(), 2);
        let names: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
        assert_eq!(names, vec!["unknown signal first", "unknown signal third"]);
    }

    #[tokio::test]
    async fn test_defaults_clear_immediately() {
        let started = Instant::now();
        let errors = run_preconditions(&LifecycleContext::new(), &RunOptions::default(), Arc::new(NeverSignals)).await;
        assert!(errors.is_empty());
        assert!(started.elapsed() < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_unknown_signal_and_interrupted_delay_both_reported() {
        let ctx = LifecycleContext::new();
        ctx.cancel();
        let options = RunOptions::default()
            .with_start_signal("NOTASIGNAL")
            .with_delay(Duration::from_secs(5));

        let errors = run_preconditions(&ctx, &options, Arc::new(NeverSignals)).await;

        assert_eq!(errors.len(), 2);
        let collected: Vec<&GateError> = errors.iter().collect();
        assert!(matches!(collected[0], GateError::UnknownSignal { .. }));
        assert!(matches!(collected[1], GateError::InterruptedWait { .. }));
    }

    #[tokio::test]
    async fn test_cancelled_signal_wait_is_not_an_error() {
        let ctx = LifecycleContext::new();
        ctx.cancel();
        let options = RunOptions::default().with_start_signal("SIGUSR1");

        let errors = run_preconditions(&ctx, &options, Arc::new(NeverSignals)).await;

        assert!(errors.is_empty());
        assert!(ctx.is_cancelled());
    }

    #[tokio::test]
    async fn test_delay_is_waited_in_full() {
        let options = RunOptions::default().with_delay(Duration::from_millis(40));
        let started = Instant::now();
        let errors = run_preconditions(&LifecycleContext::new(), &options, Arc::new(NeverSignals)).await;
        assert!(errors.is_empty());
        assert!(started.elapsed() >= Duration::from_millis(40));
    }
}
