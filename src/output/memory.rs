//! In-memory output that records every payload.
//!
//! Useful for embedding and tests; it is not registered by default.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use super::{Output, OutputRegistry};
use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;

/// Everything a [`MemoryOutput`] saw, shared with whoever created it.
#[derive(Debug, Default)]
pub struct Recorded {
    pub created: usize,
    pub dials: usize,
    pub closes: usize,
    pub payloads: Vec<Vec<u8>>,
}

/// Handle onto the shared record.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    recorded: Arc<Mutex<Recorded>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A fresh output writing into this sink.
    pub fn output(&self) -> MemoryOutput {
        self.lock().created += 1;
        MemoryOutput {
            recorded: Arc::clone(&self.recorded),
            connected: false,
        }
    }

    /// Register this sink under `name`.
    pub fn register(&self, registry: &mut OutputRegistry, name: &str) {
        let sink = self.clone();
        registry.register(name, move |_options: &crate::config::RunOptions| -> Result<Box<dyn Output>> {
            Ok(Box::new(sink.output()))
        });
    }

    pub fn created(&self) -> usize {
        self.lock().created
    }

    pub fn dials(&self) -> usize {
        self.lock().dials
    }

    pub fn closes(&self) -> usize {
        self.lock().closes
    }

    pub fn payloads(&self) -> Vec<Vec<u8>> {
        self.lock().payloads.clone()
    }

    /// Total bytes written across all payloads.
    pub fn bytes(&self) -> usize {
        self.lock().payloads.iter().map(Vec::len).sum()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Recorded> {
        self.recorded.lock().unwrap_or_else(|e| e.into_inner())
    }
}

pub struct MemoryOutput {
    recorded: Arc<Mutex<Recorded>>,
    connected: bool,
}

impl MemoryOutput {
    fn record<T>(&self, f: impl FnOnce(&mut Recorded) -> T) -> T {
        let mut guard = self.recorded.lock().unwrap_or_else(|e| e.into_inner());
        f(&mut guard)
    }
}

#[async_trait]
impl Output for MemoryOutput {
    async fn dial(&mut self, _ctx: &LifecycleContext) -> Result<()> {
        self.record(|r| r.dials += 1);
        self.connected = true;
        Ok(())
    }

    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        if !self.connected {
            return Err(StreamError::output("memory", "not connected"));
        }
        self.record(|r| r.payloads.push(payload.to_vec()));
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.record(|r| r.closes += 1);
        self.connected = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_records_lifecycle() {
        let sink = MemorySink::new();
        let mut output = sink.output();

        assert!(output.write(b"early").await.is_err());
        output.dial(&LifecycleContext::new()).await.unwrap();
        output.write(b"abc").await.unwrap();
        output.write(b"de").await.unwrap();
        output.close().await.unwrap();

        assert_eq!(sink.created(), 1);
        assert_eq!(sink.dials(), 1);
        assert_eq!(sink.closes(), 1);
        assert_eq!(sink.payloads(), vec![b"abc".to_vec(), b"de".to_vec()]);
        assert_eq!(sink.bytes(), 5);
    }

    #[test]
    fn test_register_under_name() {
        let sink = MemorySink::new();
        let mut registry = OutputRegistry::new();
        sink.register(&mut registry, "memory");

        let factory = registry.lookup("memory").unwrap();
        let _output = factory(&crate::config::RunOptions::default()).unwrap();
        assert_eq!(sink.created(), 1);
    }
}
