//! TLS output: a TCP connection wrapped in a rustls client session.
//!
//! The server certificate is verified against the webpki root store, using
//! the host part of `--addr` as the server name.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_rustls::rustls::pki_types::ServerName;
use tokio_rustls::rustls::{ClientConfig, RootCertStore};

use super::{Output, dial_until_cancelled, require_addr, split_host};
use crate::config::RunOptions;
use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;

pub struct TlsOutput {
    addr: String,
    server_name: ServerName<'static>,
    connector: TlsConnector,
    conn: Option<TlsStream<TcpStream>>,
}

impl TlsOutput {
    pub fn new(addr: impl Into<String>) -> Result<Self> {
        let addr = addr.into();
        let host = split_host(&addr)
            .ok_or_else(|| StreamError::Config(format!("tls address {:?} must be host:port", addr)))?;
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| StreamError::Config(format!("invalid tls server name {:?}: {}", host, e)))?;

        Ok(Self {
            connector: TlsConnector::from(Arc::new(client_config()?)),
            server_name,
            addr,
            conn: None,
        })
    }
}

fn client_config() -> Result<ClientConfig> {
    let mut roots = RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());

    let provider = Arc::new(tokio_rustls::rustls::crypto::ring::default_provider());
    let config = ClientConfig::builder_with_provider(provider)
        .with_safe_default_protocol_versions()
        .map_err(|e| StreamError::output("tls", e))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(config)
}

pub fn factory(options: &RunOptions) -> Result<Box<dyn Output>> {
    Ok(Box::new(TlsOutput::new(require_addr("tls", options)?)?))
}

#[async_trait]
impl Output for TlsOutput {
    async fn dial(&mut self, ctx: &LifecycleContext) -> Result<()> {
        let connector = self.connector.clone();
        let server_name = self.server_name.clone();
        let addr = self.addr.clone();
        let handshake = async move {
            let tcp = TcpStream::connect(addr.as_str()).await?;
            connector.connect(server_name, tcp).await
        };
        let stream = dial_until_cancelled(ctx, "tls", handshake).await?;
        log::info!("Connected to tls://{}", self.addr);
        self.conn = Some(stream);
        Ok(())
    }

    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| StreamError::output("tls", "not connected"))?;
        conn.write_all(payload).await.map_err(|e| StreamError::output("tls", e))?;
        conn.flush().await.map_err(|e| StreamError::output("tls", e))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            conn.shutdown().await.map_err(|e| StreamError::output("tls", e))?;
        }
        Ok(())
    }
}
