//! Byte transport under a Bolt session: plain TCP or TLS over TCP.

use std::io;
use std::pin::Pin;
use std::task::{Context, Poll};

use tokio::io::{AsyncRead, AsyncWrite, ReadBuf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_rustls::client::TlsStream;
use tracing::debug;

use crate::bolt::{BoltError, BoltResult};
use crate::dbapi::config::{ConnectConfig, SslMode};

use super::tls;

/// Connected byte stream.
pub enum Transport {
    /// Unencrypted TCP
    Plain(TcpStream),
    /// TLS over TCP
    Tls(Box<TlsStream<TcpStream>>),
}

impl Transport {
    /// Open the TCP connection and, when required, run the TLS handshake.
    ///
    /// Both steps share the configured connect timeout.
    pub async fn open(config: &ConnectConfig) -> BoltResult<Self> {
        timeout(config.connect_timeout, Self::connect(config))
            .await
            .map_err(|_| BoltError::Timeout)?
    }

    async fn connect(config: &ConnectConfig) -> BoltResult<Self> {
        let host = config.target_host();
        let port = config.port;
        let stream = TcpStream::connect((host, port)).await.map_err(|e| {
            BoltError::Io(io::Error::new(
                e.kind(),
                format!("failed to connect to {}:{}: {}", host, port, e),
            ))
        })?;
        stream.set_nodelay(true).ok();
        debug!(host, port, tls = config.sslmode == SslMode::Require, "tcp connected");

        match config.sslmode {
            SslMode::Disable => Ok(Transport::Plain(stream)),
            SslMode::Require => {
                let stream = tls::connect(stream, config).await?;
                Ok(Transport::Tls(Box::new(stream)))
            }
        }
    }

    /// Whether the stream is encrypted.
    pub fn is_tls(&self) -> bool {
        matches!(self, Transport::Tls(_))
    }
}

impl AsyncRead for Transport {
    fn poll_read(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_read(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_read(cx, buf),
        }
    }
}

impl AsyncWrite for Transport {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<io::Result<usize>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_write(cx, buf),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_write(cx, buf),
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_flush(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_flush(cx),
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        match self.get_mut() {
            Transport::Plain(s) => Pin::new(s).poll_shutdown(cx),
            Transport::Tls(s) => Pin::new(s.as_mut()).poll_shutdown(cx),
        }
    }
}

impl std::fmt::Debug for Transport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let peer = match self {
            Transport::Plain(s) => s.peer_addr().ok(),
            Transport::Tls(s) => s.get_ref().0.peer_addr().ok(),
        };
        f.debug_struct("Transport")
            .field("tls", &self.is_tls())
            .field("peer", &peer)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_plain_transport_round_trip() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 4];
            socket.read_exact(&mut buf).await.unwrap();
            socket.write_all(&buf).await.unwrap();
        });

        let config = ConnectConfig::builder("127.0.0.1")
            .with_port(u32::from(port))
            .build()
            .unwrap();
        let mut transport = Transport::open(&config).await.unwrap();
        assert!(!transport.is_tls());
        transport.write_all(b"ping").await.unwrap();
        let mut buf = [0u8; 4];
        transport.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_connect_refused() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = ConnectConfig::builder("127.0.0.1")
            .with_port(u32::from(port))
            .with_connect_timeout(Duration::from_secs(5))
            .build()
            .unwrap();
        assert!(Transport::open(&config).await.is_err());
    }
}
