//! Transport module - how the worker reaches the SAS server.
//!
//! The worker only ever writes to the server, so a connection is any
//! [`AsyncWrite`] stream. [`Connector`] is the seam between the worker and
//! the network: production code uses [`TcpConnector`], tests plug in
//! in-memory streams.

mod tcp;

use std::fmt;

use async_trait::async_trait;
use tokio::io::AsyncWrite;

use crate::error::Result;

pub use tcp::{TcpConnector, DEFAULT_CONNECT_TIMEOUT};

/// A connected, write-only stream to the server.
pub type BoxedStream = Box<dyn AsyncWrite + Send + Unpin>;

/// Opens connections to the server.
#[async_trait]
pub trait Connector: Send + Sync + fmt::Debug {
    /// Open a new connection.
    async fn connect(&self) -> Result<BoxedStream>;

    /// Address used in log messages.
    fn peer(&self) -> String;
}
