//! Delay gate: hold the run for a fixed duration.
//!
//! Unlike the signal gate, a delay cut short by cancellation is an error,
//! since downstream work assumes the full delay has passed.

use std::time::Duration;

use async_trait::async_trait;
use log::info;
use tokio::time::Instant;

use super::Precondition;
use crate::error::{Cancelled, GateError};
use crate::lifecycle::LifecycleContext;

/// Sleep for `delay`, measured from this call, unless `ctx` is cancelled first.
pub async fn wait_for_delay(ctx: &LifecycleContext, delay: Duration) -> Result<(), GateError> {
    if delay.is_zero() {
        return Ok(());
    }

    info!("Delaying connection for {:?}", delay);
    let started = Instant::now();
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(GateError::InterruptedWait {
            delay,
            elapsed: started.elapsed(),
            source: Cancelled,
        }),
        _ = tokio::time::sleep(delay) => Ok(()),
    }
}

pub struct DelayGate {
    delay: Duration,
}

impl DelayGate {
    pub fn new(delay: Duration) -> Self {
        Self { delay }
    }
}

#[async_trait]
impl Precondition for DelayGate {
    fn name(&self) -> &str {
        "delay"
    }

    async fn wait(&self, ctx: &LifecycleContext) -> Result<(), GateError> {
        wait_for_delay(ctx, self.delay).await
    }
}
