//! UDP output: one datagram per payload.

use async_trait::async_trait;
use tokio::net::UdpSocket;

use super::{Output, dial_until_cancelled, require_addr};
use crate::config::RunOptions;
use crate::error::{Result, StreamError};
use crate::lifecycle::LifecycleContext;

pub struct UdpOutput {
    addr: String,
    socket: Option<UdpSocket>,
}

impl UdpOutput {
    pub fn new(addr: impl Into<String>) -> Self {
        Self {
            addr: addr.into(),
            socket: None,
        }
    }
}

pub fn factory(options: &RunOptions) -> Result<Box<dyn Output>> {
    Ok(Box::new(UdpOutput::new(require_addr("udp", options)?)))
}

async fn connect(addr: &str) -> std::io::Result<UdpSocket> {
    let target = tokio::net::lookup_host(addr)
        .await?
        .next()
        .ok_or_else(|| std::io::Error::new(std::io::ErrorKind::NotFound, format!("no address for {}", addr)))?;
    let local = if target.is_ipv4() { "0.0.0.0:0" } else { "[::]:0" };
    let socket = UdpSocket::bind(local).await?;
    socket.connect(target).await?;
    Ok(socket)
}

#[async_trait]
impl Output for UdpOutput {
    async fn dial(&mut self, ctx: &LifecycleContext) -> Result<()> {
        let socket = dial_until_cancelled(ctx, "udp", connect(&self.addr)).await?;
        log::info!("Sending to udp://{}", self.addr);
        self.socket = Some(socket);
        Ok(())
    }

    async fn write(&mut self, payload: &[u8]) -> Result<()> {
        let socket = self
            .socket
            .as_ref()
            .ok_or_else(|| StreamError::output("udp", "not connected"))?;
        socket.send(payload).await.map_err(|e| StreamError::output("udp", e))?;
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.socket = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_factory_requires_addr() {
        assert!(matches!(factory(&RunOptions::default()), Err(StreamError::Config(_))));
    }

    #[tokio::test]
    async fn test_one_datagram_per_payload() {
        let server = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap().to_string();

        let mut output = UdpOutput::new(addr);
        output.dial(&LifecycleContext::new()).await.unwrap();
        output.write(b"one").await.unwrap();
        output.write(b"two").await.unwrap();

        let mut buf = [0u8; 64];
        let (n, _) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"one");
        let (n, _) = server.recv_from(&mut buf).await.unwrap();
        assert_eq!(&buf[..n], b"two");

        output.close().await.unwrap();
        assert!(output.write(b"three").await.is_err());
    }
}
