//! Output sinks - protocol-specific transports selected by name.
//!
//! Protocols register a factory in an [`OutputRegistry`] before the
//! dispatcher resolves `--protocol`. Lookup is by exact name and an
//! unregistered name is a reportable error.

pub mod memory;
pub mod tcp;
pub mod tls;
pub mod udp;

use std::collections::BTreeMap;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::RunOptions;
use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;

/// A connected destination for payloads.
#[async_trait]
pub trait Output: Send {
    /// Connect to the destination, giving up if `ctx` is cancelled.
    async fn dial(&mut self, ctx: &LifecycleContext) -> Result<()>;

    /// Send one payload.
    async fn write(&mut self, payload: &[u8]) -> Result<()>;

    /// Flush and release the connection.
    async fn close(&mut self) -> Result<()>;
}

/// Builds an unconnected output from the run options.
pub type OutputFactory = Arc<dyn Fn(&RunOptions) -> Result<Box<dyn Output>> + Send + Sync>;

/// Protocol name to factory mapping.
#[derive(Clone, Default)]
pub struct OutputRegistry {
    factories: BTreeMap<String, OutputFactory>,
}

impl OutputRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the tcp, udp and tls outputs.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.register("tcp", tcp::factory);
        registry.register("udp", udp::factory);
        registry.register("tls", tls::factory);
        registry
    }

    /// Register `factory` under `name`, replacing any earlier registration.
    pub fn register<F>(&mut self, name: impl Into<String>, factory: F)
    where
        F: Fn(&RunOptions) -> Result<Box<dyn Output>> + Send + Sync + 'static,
    {
        let name = name.into();
        log::debug!("Registering output {}", name);
        if self.factories.insert(name.clone(), Arc::new(factory)).is_some() {
            log::warn!("Output {} registered twice, keeping the latest", name);
        }
    }

    /// Find the factory for `name`.
    pub fn lookup(&self, name: &str) -> Result<OutputFactory> {
        self.factories
            .get(name)
            .cloned()
            .ok_or_else(|| StreamError::UnknownProtocol {
                name: name.to_string(),
                registered: self.protocols().join(", "),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Registered names in sorted order.
    pub fn protocols(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }
}

/// Run a connect future unless `ctx` is cancelled first.
pub(crate) async fn dial_until_cancelled<T, F>(ctx: &LifecycleContext, protocol: &str, connect: F) -> Result<T>
where
    F: Future<Output = std::io::Result<T>>,
{
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Err(StreamError::output(protocol, "dial cancelled")),
        result = connect => result.map_err(|e| StreamError::output(protocol, e)),
    }
}

/// Send one payload unless `ctx` is cancelled first.
///
/// Returns `false` when the write was abandoned because of cancellation.
pub(crate) async fn write_until_cancelled(ctx: &LifecycleContext, output: &mut dyn Output, payload: &[u8]) -> Result<bool> {
    tokio::select! {
        biased;
        _ = ctx.cancelled() => Ok(false),
        result = output.write(payload) => result.map(|()| true),
    }
}

/// Split `host:port`, accepting bracketed IPv6 hosts.
pub(crate) fn split_host(addr: &str) -> Option<&str> {
    let (host, port) = addr.rsplit_once(':')?;
    if port.is_empty() || host.is_empty() {
        return None;
    }
    Some(host.trim_start_matches('[').trim_end_matches(']'))
}

pub(crate) fn require_addr(protocol: &str, options: &RunOptions) -> Result<String> {
    if options.addr.is_empty() {
        return Err(StreamError::Config(format!("--addr is required for {} output", protocol)));
    }
    Ok(options.addr.clone())
}
