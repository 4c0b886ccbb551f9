//! Cancellation source: turns process interrupts into one cancelled token.
//!
//! ```text
//! SIGINT ─► watcher task ─► root.cancel()  (first interrupt only)
//!                              │
//!                              └─► every derived token observes it
//! ```
//!
//! The watcher is owned by [`CancellationSource`] and stops when the source
//! is shut down or dropped.

use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use futures::stream::{BoxStream, Stream, StreamExt};
use log::{debug, info};
use tokio::signal::unix::{SignalKind, signal};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Owns the root lifecycle token and the task that cancels it on interrupt.
pub struct CancellationSource {
    root: CancellationToken,
    interrupts: Arc<AtomicUsize>,
    watcher: JoinHandle<()>,
}

impl CancellationSource {
    /// Subscribe to the process interrupt signal and start watching it.
    ///
    /// Must be called from within a tokio runtime.
    pub fn install() -> io::Result<Self> {
        Ok(Self::from_interrupts(interrupt_stream()?))
    }

    /// Watch an arbitrary stream of interrupt notifications.
    pub fn from_interrupts<S>(interrupts: S) -> Self
    where
        S: Stream<Item = ()> + Send + 'static,
    {
        let root = CancellationToken::new();
        let seen = Arc::new(AtomicUsize::new(0));

        let token = root.clone();
        let counter = Arc::clone(&seen);
        let watcher = tokio::spawn(async move {
            let mut interrupts = Box::pin(interrupts);
            while interrupts.next().await.is_some() {
                let count = counter.fetch_add(1, Ordering::SeqCst) + 1;
                if count == 1 {
                    info!("Interrupt received, cancelling run");
                    token.cancel();
                } else {
                    debug!("Interrupt #{} ignored, run already cancelled", count);
                }
            }
        });

        Self {
            root,
            interrupts: seen,
            watcher,
        }
    }

    /// A context derived from the root; cancelled whenever the root is.
    pub fn token(&self) -> CancellationToken {
        self.root.child_token()
    }

    pub fn is_cancelled(&self) -> bool {
        self.root.is_cancelled()
    }

    /// Number of interrupts observed so far.
    pub fn interrupts(&self) -> usize {
        self.interrupts.load(Ordering::SeqCst)
    }

    /// Stop watching. Later interrupts are no longer observed.
    pub async fn shutdown(mut self) {
        self.watcher.abort();
        let _ = (&mut self.watcher).await;
        debug!("Interrupt watcher stopped");
    }
}

impl Drop for CancellationSource {
    fn drop(&mut self) {
        self.watcher.abort();
    }
}

fn interrupt_stream() -> io::Result<BoxStream<'static, ()>> {
    let sigint = signal(SignalKind::interrupt())?;
    Ok(futures::stream::unfold(sigint, |mut sigint| async move {
        sigint.recv().await.map(|()| ((), sigint))
    })
    .boxed())
}
