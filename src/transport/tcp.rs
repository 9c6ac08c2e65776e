use std::time::Duration;

use async_trait::async_trait;
use tokio::net::TcpStream;
use tracing::debug;

use super::{BoxedStream, Connector};
use crate::error::{Result, SasError};

/// How long a TCP connect may take before the attempt is abandoned.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Connects to SAS over TCP.
#[derive(Debug, Clone)]
pub struct TcpConnector {
    host: String,
    port: u16,
    timeout: Duration,
}

impl TcpConnector {
    /// Connector for `host:port` with the default connect timeout.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    /// Set the connect timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

#[async_trait]
impl Connector for TcpConnector {
    async fn connect(&self) -> Result<BoxedStream> {
        let connect = TcpStream::connect((self.host.as_str(), self.port));
        let stream = tokio::time::timeout(self.timeout, connect)
            .await
            .map_err(|_| SasError::ConnectTimeout)??;

        // Frames are small and latency matters more than packet count.
        stream.set_nodelay(true)?;
        debug!(peer = %self.peer(), "TCP connection established");
        Ok(Box::new(stream))
    }

    fn peer(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_connects_to_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let connector = TcpConnector::new("127.0.0.1", port);

        let (mut stream, accepted) = tokio::join!(connector.connect(), listener.accept());
        let (mut server, _) = accepted.unwrap();
        stream.as_mut().unwrap().write_all(b"ping").await.unwrap();

        let mut buf = [0u8; 4];
        server.read_exact(&mut buf).await.unwrap();
        assert_eq!(&buf, b"ping");
    }

    #[tokio::test]
    async fn test_refused_connection_is_io_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = TcpConnector::new("127.0.0.1", port)
            .with_timeout(Duration::from_secs(2))
            .connect()
            .await;
        assert!(matches!(result, Err(SasError::Io(_))));
    }

    #[test]
    fn test_peer() {
        let connector = TcpConnector::new("sas.example.com", 6761);
        assert_eq!(connector.peer(), "sas.example.com:6761");
        assert_eq!(connector.host(), "sas.example.com");
        assert_eq!(connector.port(), 6761);
    }
}
