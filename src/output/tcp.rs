//! TCP output: one stream connection, payloads written back to back.

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

use super::{Output, dial_until_cancelled, require_addr};
use crate::config::RunOptions;
use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;

pub struct TcpOutput {
    addr: String,
    conn: Option<TcpStream>,
}

impl TcpOutput {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            conn: None,
        }
    }
}

pub fn factory(options: &RunOptions) -> Result<Box<dyn Output>> {
    Ok(Box::new(TcpOutput::new(require_addr("tcp", options)?)))
}

#[async_trait]
impl Output for TcpOutput {
    async fn dial(&mut self, ctx: &LifecycleContext) -> Result<()> {
        let stream = dial_until_cancelled(ctx, "tcp", TcpStream::connect(self.addr.as_str())).await?;
        log::info!("Connected to tcp://{}", self.addr);
        self.conn = Some(stream);
        Ok(())
    }

    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        let conn = self
            .conn
            .as_mut()
            .ok_or_else(|| StreamError::output("tcp", "not connected"))?;
        conn.write_all(payload)
            .await
            .map_err(|e| StreamError::output("tcp", e))
    }

    async fn close(&mut self) -> Result<()> {
        if let Some(mut conn) = self.conn.take() {
            conn.shutdown().await.map_err(|e| StreamError::output("tcp", e))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    #[test]
    fn test_factory_requires_addr() {
        assert!(matches!(factory(&RunOptions::default()), Err(StreamError::Config(_))));
    }

    #[tokio::test]
    async fn test_write_before_dial_fails() {
        let mut output = TcpOutput::new("127.0.0.1:1");
        assert!(output.write(b"x").await.is_err());
    }

    #[tokio::test]
    async fn test_sends_payloads() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut received = String::new();
            socket.read_to_string(&mut received).await.unwrap();
            received
        });

        let mut output = TcpOutput::new(addr);
        output.dial(&LifecycleContext::new()).await.unwrap();
        output.write(b"first\n").await.unwrap();
        output.write(b"second\n").await.unwrap();
        output.close().await.unwrap();

        assert_eq!(server.await.unwrap(), "first\nsecond\n");
    }

    #[tokio::test]
    async fn test_close_without_dial_is_ok() {
        let mut output = TcpOutput::new("127.0.0.1:1");
        assert!(output.close().await.is_ok());
    }
}
