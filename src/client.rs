//! Client facade.
//!
//! The [`Client`] owns the delivery queue and the connection worker and
//! manages their lifecycle:
//! 1. `start()` builds a fresh queue and spawns a worker, which connects in
//!    the background
//! 2. `send()` enqueues messages without ever blocking or failing
//! 3. `stop()` shuts the worker down and waits for it to close the socket
//!
//! # Example
//!
//! ```no_run
//! use sas_client::message::{DataMessage, Event};
//! use sas_client::{Client, Trail};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), sas_client::SasError> {
//!     let mut client = Client::builder("sprout-1", "sprout", "org.projectclearwater", "sas.example.com")
//!         .heartbeat_interval(std::time::Duration::from_secs(1))
//!         .start()
//!         .await?;
//!
//!     let trail = Trail::next();
//!     client.send(Event::new(trail, 0x0001).add_variable_param("hello")?);
//!
//!     client.stop().await;
//!     Ok(())
//! }
//! ```

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{info, trace};

use crate::config::ClientConfig;
use crate::error::Result;
use crate::message::Message;
use crate::queue::{delivery_queue, QueueSender};
use crate::transport::{Connector, TcpConnector};
use crate::worker::{spawn_worker, ConnectionState, WorkerHandle};

/// Anything messages can be reported to.
///
/// Application code can take a `&dyn MessageSink` and be handed a real
/// [`Client`] in production and a [`RecordingClient`] in tests.
pub trait MessageSink: Send + Sync {
    /// Report a message. Never blocks and never fails.
    fn send_message(&self, message: Message);
}

/// Builder for configuring and creating a SAS client.
pub struct ClientBuilder {
    config: ClientConfig,
    connector: Option<Arc<dyn Connector>>,
}

impl ClientBuilder {
    /// Create a builder with the required identity and server address.
    pub fn new(
        system_name: impl Into<String>,
        system_type: impl Into<String>,
        resource_identifier: impl Into<String>,
        server_address: impl Into<String>,
    ) -> Self {
        Self::from_config(ClientConfig::new(
            system_name,
            system_type,
            resource_identifier,
            server_address,
        ))
    }

    /// Start from an existing configuration.
    pub fn from_config(config: ClientConfig) -> Self {
        Self {
            config,
            connector: None,
        }
    }

    /// Set the resource bundle version.
    ///
    /// Default: empty
    pub fn resource_version(mut self, version: impl Into<String>) -> Self {
        self.config.resource_version = version.into();
        self
    }

    /// SAS server port.
    ///
    /// Default: 6761
    pub fn port(mut self, port: u16) -> Self {
        self.config.port = port;
        self
    }

    /// Messages held while disconnected.
    ///
    /// Default: 10 000, minimum 100
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity;
        self
    }

    /// Default: 10 seconds
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// Default: 10 seconds
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.config.send_timeout = timeout;
        self
    }

    /// Idle time before a heartbeat is sent.
    ///
    /// Default: 1 second
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval = interval;
        self
    }

    /// Bounds of the reconnect backoff.
    ///
    /// Default: 100 milliseconds to 5 seconds
    pub fn reconnect_wait(mut self, min: Duration, max: Duration) -> Self {
        self.config.min_reconnect_wait = min;
        self.config.max_reconnect_wait = max;
        self
    }

    /// Use a custom connector instead of TCP.
    pub fn connector(mut self, connector: Arc<dyn Connector>) -> Self {
        self.connector = Some(connector);
        self
    }

    /// Validate the configuration and create a stopped client.
    pub fn build(self) -> Result<Client> {
        match self.connector {
            Some(connector) => Client::with_connector(self.config, connector),
            None => Client::new(self.config),
        }
    }

    /// Build the client and start it.
    pub async fn start(self) -> Result<Client> {
        let mut client = self.build()?;
        client.start().await?;
        Ok(client)
    }
}

/// State belonging to one start/stop cycle.
#[derive(Debug)]
struct Running {
    queue: QueueSender,
    worker: WorkerHandle,
}

/// A SAS client.
///
/// Sending is cheap and safe from any task; the client itself is `Send` and
/// `Sync`, so it can be shared behind an `Arc`.
pub struct Client {
    config: ClientConfig,
    connector: Arc<dyn Connector>,
    running: Option<Running>,
}

impl Client {
    /// Create a builder.
    pub fn builder(
        system_name: impl Into<String>,
        system_type: impl Into<String>,
        resource_identifier: impl Into<String>,
        server_address: impl Into<String>,
    ) -> ClientBuilder {
        ClientBuilder::new(system_name, system_type, resource_identifier, server_address)
    }

    /// Create a stopped client connecting over TCP.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let connector = TcpConnector::new(config.server_address.clone(), config.port)
            .with_timeout(config.connect_timeout);
        Self::with_connector(config, Arc::new(connector))
    }

    /// Create a stopped client using `connector` to reach the server.
    pub fn with_connector(config: ClientConfig, connector: Arc<dyn Connector>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            connector,
            running: None,
        })
    }

    /// Configuration this client was built with.
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Start delivering messages.
    ///
    /// The connection is made in the background; this returns as soon as
    /// the worker is running. A running client is stopped and restarted
    /// with a fresh queue.
    pub async fn start(&mut self) -> Result<()> {
        if self.running.is_some() {
            info!("SAS client already running, restarting");
            self.stop().await;
        }

        let settings = self.config.worker_settings()?;
        let (queue, receiver) = delivery_queue(self.config.effective_queue_capacity());
        let worker = spawn_worker(
            self.connector.clone(),
            receiver,
            settings,
            CancellationToken::new(),
        );

        info!(
            peer = %self.connector.peer(),
            system = %self.config.system_name,
            capacity = queue.capacity(),
            "SAS client started"
        );
        self.running = Some(Running { queue, worker });
        Ok(())
    }

    /// Stop the worker and wait for it to close the connection.
    ///
    /// Messages still queued are abandoned. Does nothing if not running.
    pub async fn stop(&mut self) {
        if let Some(running) = self.running.take() {
            info!(pending = running.queue.pending_count(), "Stopping SAS client");
            running.worker.stop().await;
        }
    }

    /// Queue a message for delivery.
    ///
    /// Never blocks and never fails: if the client is stopped, the worker
    /// has failed, or the queue is full, the message is dropped.
    pub fn send(&self, message: impl Into<Message>) {
        let message = message.into();
        match &self.running {
            Some(running) => {
                if let Err(e) = running.queue.try_enqueue(message) {
                    trace!(error = %e, "Dropped SAS message");
                }
            }
            None => trace!("SAS client not running, dropping message"),
        }
    }

    /// Whether `start()` has been called without a matching `stop()`.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Connection state of the current worker, `Stopped` when not running.
    pub fn connection_state(&self) -> ConnectionState {
        self.running
            .as_ref()
            .map_or(ConnectionState::Stopped, |r| r.worker.state())
    }

    /// Receiver notified on connection state changes of the current worker.
    pub fn subscribe_state(&self) -> Option<watch::Receiver<ConnectionState>> {
        self.running.as_ref().map(|r| r.worker.subscribe())
    }

    /// Messages queued but not yet sent.
    pub fn pending(&self) -> usize {
        self.running
            .as_ref()
            .map_or(0, |r| r.queue.pending_count())
    }

    /// Whether the current queue has overflowed and dropped messages.
    pub fn is_discarding(&self) -> bool {
        self.running
            .as_ref()
            .is_some_and(|r| r.queue.is_discarding())
    }
}

impl MessageSink for Client {
    fn send_message(&self, message: Message) {
        self.send(message);
    }
}

impl Drop for Client {
    fn drop(&mut self) {
        if let Some(running) = &self.running {
            running.worker.cancel();
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("peer", &self.connector.peer())
            .field("system_name", &self.config.system_name)
            .field("state", &self.connection_state())
            .finish()
    }
}

/// In-memory stand-in for [`Client`] that records every message sent.
#[derive(Debug, Default)]
pub struct RecordingClient {
    messages: Mutex<Vec<Message>>,
}

impl RecordingClient {
    /// Empty recorder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message instead of sending it.
    pub fn send(&self, message: impl Into<Message>) {
        self.lock().push(message.into());
    }

    /// Copy of everything sent so far.
    pub fn messages(&self) -> Vec<Message> {
        self.lock().clone()
    }

    /// Remove and return everything sent so far.
    pub fn take(&self) -> Vec<Message> {
        std::mem::take(&mut *self.lock())
    }

    /// Number of recorded messages.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether nothing has been recorded.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Message>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MessageSink for RecordingClient {
    fn send_message(&self, message: Message) {
        self.send(message);
    }
}
