//! Command dispatcher - resolve the output, clear startup, then stream.
//!
//! ```text
//! Created ─► PreconditionsRunning ─► Ready ─► Streaming ─► Completed
//!    │                 │                           │
//!    └──── Aborted ◄───┘                           └──► Failed
//! ```
//!
//! Protocol resolution happens before any gate runs, and no output is
//! created unless every gate cleared. There is no retry at this layer;
//! `RunOptions::retries` is for the output alone.

use std::sync::Arc;
use std::time::Duration;

use log::{debug, error, info, warn};

use crate::config::RunOptions;
use crate::error::{Result, StreamError};
use crate::gates::SignalSource;
use crate::lifecycle::LifecycleContext;
use crate::output::{Output, OutputFactory, OutputRegistry};
use crate::runner::Workload;
use crate::startup::run_preconditions;

/// How long a close may take once the run has been cancelled.
const CANCELLED_CLOSE_GRACE: Duration = Duration::from_secs(2);

/// Where a single invocation currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    Created,
    PreconditionsRunning,
    Ready,
    /// Startup failed; nothing was sent
    Aborted,
    Streaming,
    Completed,
    /// The output or the workload failed
    Failed,
}

impl RunState {
    /// Returns true if the invocation has finished
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Aborted | RunState::Completed | RunState::Failed)
    }
}

pub struct Dispatcher {
    registry: OutputRegistry,
    signals: Arc<dyn SignalSource>,
    state: RunState,
}

impl Dispatcher {
    pub fn new(registry: OutputRegistry, signals: Arc<dyn SignalSource>) -> Self {
        Self {
            registry,
            signals,
            state: RunState::Created,
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    fn transition(&mut self, next: RunState) {
        debug!("Run state {:?} -> {:?}", self.state, next);
        self.state = next;
    }

    /// Run one invocation of `workload`, returning the number of payloads sent.
    pub async fn dispatch(&mut self, ctx: &LifecycleContext, options: &RunOptions, workload: &Workload) -> Result<usize> {
        self.state = RunState::Created;

        let factory = match self.registry.lookup(&options.protocol) {
            Ok(factory) => factory,
            Err(e) => {
                self.transition(RunState::Aborted);
                return Err(e);
            }
        };

        self.transition(RunState::PreconditionsRunning);
        let errors = run_preconditions(ctx, options, Arc::clone(&self.signals)).await;
        if let Err(errors) = errors.into_result() {
            error!("Startup aborted, {} precondition(s) failed", errors.len());
            self.transition(RunState::Aborted);
            return Err(errors.into());
        }
        if ctx.is_cancelled() {
            info!("Run cancelled during startup, nothing sent");
            self.transition(RunState::Aborted);
            return Err(StreamError::Interrupted);
        }
        self.transition(RunState::Ready);

        match self.stream(ctx, options, &factory, workload).await {
            Ok(sent) => {
                info!("Finished {} stream, {} payloads sent", workload.name(), sent);
                self.transition(RunState::Completed);
                Ok(sent)
            }
            Err(e) => {
                error!("{} stream failed: {}", workload.name(), e);
                self.transition(RunState::Failed);
                Err(e)
            }
        }
    }

    async fn stream(
        &mut self,
        ctx: &LifecycleContext,
        options: &RunOptions,
        factory: &OutputFactory,
        workload: &Workload,
    ) -> Result<usize> {
        self.transition(RunState::Streaming);
        info!(
            "Streaming {} over {} to {} (retry={})",
            workload.name(),
            options.protocol,
            options.addr,
            options.retries
        );

        let mut output = factory(options)?;
        output.dial(ctx).await?;

        let result = workload.run(ctx, output.as_mut()).await;
        let closed = close_output(ctx, &options.protocol, output.as_mut()).await;
        let sent = result?;
        closed?;
        Ok(sent)
    }
}

/// Close `output`, bounding the wait when the run was cancelled.
async fn close_output(ctx: &LifecycleContext, protocol: &str, output: &mut dyn Output) -> Result<()> {
    if !ctx.is_cancelled() {
        return output.close().await;
    }
    match tokio::time::timeout(CANCELLED_CLOSE_GRACE, output.close()).await {
        Ok(closed) => closed,
        Err(_) => {
            warn!("Dropping {} output, close did not finish within {:?}", protocol, CANCELLED_CLOSE_GRACE);
            Ok(())
        }
    }
}
