//! Connection worker task.
//!
//! One worker owns the connection to SAS. It connects, sends the `Init`
//! handshake straight onto the socket, then drains the delivery queue,
//! sending a heartbeat whenever the queue stays empty for a heartbeat
//! interval.
//!
//! # State machine
//!
//! ```text
//!                 connect + Init ok
//! Disconnected ─► Connecting ───────────► Connected
//!      ▲              │                       │
//!      │   failure    │      send failure     │
//!      └── backoff ◄──┴───────────────────────┘
//!
//! any state ── shutdown ──► Stopping ──► Stopped
//! ```
//!
//! Every wait (connect, dequeue, send, backoff) also watches the shutdown
//! token, so a stop request is honoured promptly. Failed sends drop the
//! message in flight; nothing is retried.

use std::any::Any;
use std::fmt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::io::AsyncWriteExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::backoff::Backoff;
use crate::error::{Result, SasError};
use crate::message::{Heartbeat, Init, Message, WireMessage};
use crate::queue::{Dequeue, QueueReceiver};
use crate::transport::{BoxedStream, Connector};

/// Connection lifecycle as seen from outside the worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    Stopping,
    Stopped,
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "disconnected",
            Self::Connecting => "connecting",
            Self::Connected => "connected",
            Self::Stopping => "stopping",
            Self::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// Timing and handshake used by a worker.
#[derive(Debug, Clone)]
pub struct WorkerSettings {
    /// Handshake sent on every new connection.
    pub init: Init,
    /// Idle time after which a heartbeat is sent.
    pub heartbeat_interval: Duration,
    /// Upper bound on writing one message.
    pub send_timeout: Duration,
    /// First wait after a failed connection.
    pub min_reconnect_wait: Duration,
    /// Cap on the doubling reconnect wait.
    pub max_reconnect_wait: Duration,
}

/// Handle to a running worker.
#[derive(Debug)]
pub struct WorkerHandle {
    task: JoinHandle<()>,
    state: watch::Receiver<ConnectionState>,
    shutdown: CancellationToken,
}

impl WorkerHandle {
    /// Current connection state.
    pub fn state(&self) -> ConnectionState {
        *self.state.borrow()
    }

    /// Receiver notified on every state change.
    pub fn subscribe(&self) -> watch::Receiver<ConnectionState> {
        self.state.clone()
    }

    /// Ask the worker to stop without waiting for it.
    pub fn cancel(&self) {
        self.shutdown.cancel();
    }

    /// Whether the worker task has exited.
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Stop the worker and wait until it has closed its connection.
    pub async fn stop(self) {
        self.shutdown.cancel();
        if let Err(e) = self.task.await {
            warn!(error = %e, "SAS worker task did not exit cleanly");
        }
    }
}

/// Spawn a worker draining `queue` onto connections from `connector`.
///
/// Must be called from within a tokio runtime.
pub fn spawn_worker(
    connector: Arc<dyn Connector>,
    queue: QueueReceiver,
    settings: WorkerSettings,
    shutdown: CancellationToken,
) -> WorkerHandle {
    let (state_tx, state_rx) = watch::channel(ConnectionState::Disconnected);
    let state_tx = Arc::new(state_tx);

    let worker = Worker {
        backoff: Backoff::new(settings.min_reconnect_wait, settings.max_reconnect_wait),
        connector,
        queue,
        settings,
        state: state_tx.clone(),
        shutdown: shutdown.clone(),
    };

    let task = tokio::spawn(async move {
        if let Err(panic) = AssertUnwindSafe(worker.run()).catch_unwind().await {
            error!(
                reason = panic_reason(&*panic),
                "SAS worker failed unexpectedly, SAS logs will no longer be made"
            );
            state_tx.send_replace(ConnectionState::Stopped);
        }
    });

    WorkerHandle {
        task,
        state: state_rx,
        shutdown,
    }
}

fn panic_reason(panic: &(dyn Any + Send)) -> &str {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s
    } else {
        "unknown panic"
    }
}

/// Why a connected session ended.
enum SessionEnd {
    Shutdown,
    SendFailed,
    QueueClosed,
}

struct Worker {
    connector: Arc<dyn Connector>,
    queue: QueueReceiver,
    settings: WorkerSettings,
    backoff: Backoff,
    state: Arc<watch::Sender<ConnectionState>>,
    shutdown: CancellationToken,
}

impl Worker {
    async fn run(mut self) {
        let open = self.connection_loop().await;

        self.set_state(ConnectionState::Stopping);
        // Observers see Stopping even when nothing below awaits.
        tokio::task::yield_now().await;
        if let Some(stream) = open {
            close(stream).await;
        }

        let abandoned = self.queue.pending_count();
        if abandoned > 0 {
            warn!(abandoned, "SAS worker stopped with messages still queued");
        }
        self.set_state(ConnectionState::Stopped);
        info!("SAS worker stopped");
    }

    /// Connect and reconnect until shut down. Returns the connection still
    /// open at that point, if any.
    async fn connection_loop(&mut self) -> Option<BoxedStream> {
        let mut first_attempt = true;

        loop {
            if !first_attempt && !self.wait_backoff().await {
                return None;
            }
            first_attempt = false;

            self.set_state(ConnectionState::Connecting);
            info!(peer = %self.connector.peer(), "Connecting to SAS");

            let connected = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return None,
                result = self.connect() => result,
            };
            let mut stream = match connected {
                Ok(stream) => stream,
                Err(e) => {
                    error!(peer = %self.connector.peer(), error = %e, "Failed to connect to SAS");
                    self.set_state(ConnectionState::Disconnected);
                    continue;
                }
            };

            self.backoff.reset();
            self.set_state(ConnectionState::Connected);
            info!(peer = %self.connector.peer(), "Connected to SAS");

            match self.session(&mut stream).await {
                SessionEnd::SendFailed => {
                    close(stream).await;
                    self.set_state(ConnectionState::Disconnected);
                }
                SessionEnd::Shutdown | SessionEnd::QueueClosed => return Some(stream),
            }
        }
    }

    /// Open a connection and send the handshake on it.
    async fn connect(&self) -> Result<BoxedStream> {
        let mut stream = self.connector.connect().await?;
        let init: Message = self.settings.init.restamped().into();
        send_message(&mut stream, &init, self.settings.send_timeout).await?;
        Ok(stream)
    }

    /// Drain the queue onto a connected stream.
    async fn session(&mut self, stream: &mut BoxedStream) -> SessionEnd {
        loop {
            let next = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return SessionEnd::Shutdown,
                next = self.queue.dequeue(self.settings.heartbeat_interval) => next,
            };

            let message = match next {
                Dequeue::Message(message) => message,
                Dequeue::TimedOut => Heartbeat::new().into(),
                Dequeue::Closed => return SessionEnd::QueueClosed,
            };

            let sent = tokio::select! {
                biased;
                _ = self.shutdown.cancelled() => return SessionEnd::Shutdown,
                sent = send_message(stream, &message, self.settings.send_timeout) => sent,
            };
            if let Err(e) = sent {
                error!(
                    peer = %self.connector.peer(),
                    error = %e,
                    kind = %message.message_type(),
                    "Failed to send message to SAS, dropping it"
                );
                return SessionEnd::SendFailed;
            }
        }
    }

    /// Sleep for the next backoff delay. Returns false if shut down meanwhile.
    async fn wait_backoff(&mut self) -> bool {
        let delay = self.backoff.next_delay();
        debug!(delay_ms = delay.as_millis() as u64, "Waiting before reconnecting to SAS");
        tokio::select! {
            biased;
            _ = self.shutdown.cancelled() => false,
            _ = tokio::time::sleep(delay) => true,
        }
    }

    fn set_state(&self, state: ConnectionState) {
        self.state.send_replace(state);
    }
}

/// Write one encoded message, bounded by `send_timeout`.
async fn send_message(
    stream: &mut BoxedStream,
    message: &Message,
    send_timeout: Duration,
) -> Result<()> {
    let bytes = message.encode();
    if !message.is_heartbeat() {
        debug!(len = bytes.len(), "Sending message to SAS\n{}", message);
    }

    tokio::time::timeout(send_timeout, async {
        stream.write_all(&bytes).await?;
        stream.flush().await
    })
    .await
    .map_err(|_| SasError::SendTimeout)??;
    Ok(())
}

/// Close a connection, ignoring errors.
async fn close(mut stream: BoxedStream) {
    let _ = tokio::time::timeout(Duration::from_secs(1), stream.shutdown()).await;
}
