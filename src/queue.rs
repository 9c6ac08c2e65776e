//! Bounded delivery queue between callers and the connection worker.
//!
//! Producers never wait: [`QueueSender::try_enqueue`] either accepts a
//! message or drops it at once. The worker pulls messages with a bounded
//! wait so that it can send heartbeats and observe shutdown while idle.
//!
//! ```text
//! caller 1 ─┐
//! caller 2 ─┼─► QueueSender ─► mpsc (bounded) ─► QueueReceiver ─► worker
//! caller N ─┘
//! ```
//!
//! The first overflow raises a discarding flag and logs one error. The flag
//! stays raised for the lifetime of the queue; restarting the client builds
//! a new queue.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tracing::error;

use crate::error::{Result, SasError};
use crate::message::Message;

/// Smallest capacity a queue is built with.
pub const MINIMUM_QUEUE_CAPACITY: usize = 100;

/// Capacity used when none is configured.
pub const DEFAULT_QUEUE_CAPACITY: usize = 10_000;

/// Counters shared by both ends of the queue.
#[derive(Debug, Default)]
struct QueueState {
    pending: AtomicUsize,
    discarding: AtomicBool,
}

/// Create a queue holding up to `capacity` messages.
///
/// Capacities below [`MINIMUM_QUEUE_CAPACITY`] are raised to it.
pub fn delivery_queue(capacity: usize) -> (QueueSender, QueueReceiver) {
    let capacity = capacity.max(MINIMUM_QUEUE_CAPACITY);
    let (tx, rx) = mpsc::channel(capacity);
    let state = Arc::new(QueueState::default());

    let sender = QueueSender {
        tx,
        state: state.clone(),
        capacity,
    };
    let receiver = QueueReceiver { rx, state };
    (sender, receiver)
}

/// Producer side of the queue. Cheap to clone.
#[derive(Debug, Clone)]
pub struct QueueSender {
    tx: mpsc::Sender<Message>,
    state: Arc<QueueState>,
    capacity: usize,
}

impl QueueSender {
    /// Enqueue without waiting.
    ///
    /// Returns `Err(QueueFull)` when the queue is at capacity and
    /// `Err(ConnectionClosed)` once the worker has gone away. Either way the
    /// message is dropped.
    pub fn try_enqueue(&self, message: Message) -> Result<()> {
        self.state.pending.fetch_add(1, Ordering::AcqRel);

        self.tx.try_send(message).map_err(|e| {
            self.state.pending.fetch_sub(1, Ordering::Release);
            match e {
                mpsc::error::TrySendError::Full(_) => {
                    if !self.state.discarding.swap(true, Ordering::AcqRel) {
                        error!(
                            capacity = self.capacity,
                            "SAS message queue is full, discarding messages"
                        );
                    }
                    SasError::QueueFull
                }
                mpsc::error::TrySendError::Closed(_) => SasError::ConnectionClosed,
            }
        })
    }

    /// Whether the queue has overflowed at least once.
    #[inline]
    pub fn is_discarding(&self) -> bool {
        self.state.discarding.load(Ordering::Acquire)
    }

    /// Messages accepted but not yet taken by the worker.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }

    /// Maximum number of queued messages.
    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Outcome of a bounded wait on the queue.
#[derive(Debug)]
pub enum Dequeue {
    /// The next message in FIFO order.
    Message(Message),
    /// Nothing arrived within the timeout.
    TimedOut,
    /// Every sender has been dropped and the queue is empty.
    Closed,
}

/// Consumer side of the queue, owned by the worker.
#[derive(Debug)]
pub struct QueueReceiver {
    rx: mpsc::Receiver<Message>,
    state: Arc<QueueState>,
}

impl QueueReceiver {
    /// Wait up to `timeout` for the next message.
    pub async fn dequeue(&mut self, timeout: Duration) -> Dequeue {
        match tokio::time::timeout(timeout, self.rx.recv()).await {
            Ok(Some(message)) => {
                self.state.pending.fetch_sub(1, Ordering::Release);
                Dequeue::Message(message)
            }
            Ok(None) => Dequeue::Closed,
            Err(_) => Dequeue::TimedOut,
        }
    }

    /// Messages still waiting.
    #[inline]
    pub fn pending_count(&self) -> usize {
        self.state.pending.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{Event, Heartbeat};
    use crate::trail::Trail;

    fn event(id: u32) -> Message {
        Event::new(Trail::from_id(1), id).into()
    }

    #[test]
    fn test_capacity_floor() {
        let (tx, _rx) = delivery_queue(1);
        assert_eq!(tx.capacity(), MINIMUM_QUEUE_CAPACITY);

        let (tx, _rx) = delivery_queue(DEFAULT_QUEUE_CAPACITY);
        assert_eq!(tx.capacity(), DEFAULT_QUEUE_CAPACITY);
    }

    #[test]
    fn test_overflow_drops_extra_message() {
        let capacity = MINIMUM_QUEUE_CAPACITY;
        let (tx, _rx) = delivery_queue(capacity);

        for id in 0..capacity {
            tx.try_enqueue(event(id as u32)).unwrap();
        }
        assert!(!tx.is_discarding());
        assert_eq!(tx.pending_count(), capacity);

        let err = tx.try_enqueue(event(999)).unwrap_err();
        assert!(matches!(err, SasError::QueueFull));
        assert!(tx.is_discarding());
        assert_eq!(tx.pending_count(), capacity);
    }

    #[tokio::test]
    async fn test_discarding_flag_is_sticky() {
        let (tx, mut rx) = delivery_queue(MINIMUM_QUEUE_CAPACITY);
        for id in 0..=MINIMUM_QUEUE_CAPACITY {
            let _ = tx.try_enqueue(event(id as u32));
        }
        assert!(tx.is_discarding());

        while let Dequeue::Message(_) = rx.dequeue(Duration::from_millis(10)).await {}
        assert_eq!(rx.pending_count(), 0);
        assert!(tx.is_discarding());

        tx.try_enqueue(event(1)).unwrap();
    }

    #[tokio::test]
    async fn test_fifo_order() {
        let (tx, mut rx) = delivery_queue(DEFAULT_QUEUE_CAPACITY);
        for id in 0..10 {
            tx.try_enqueue(event(id)).unwrap();
        }

        for id in 0..10 {
            match rx.dequeue(Duration::from_secs(1)).await {
                Dequeue::Message(Message::Event(e)) => assert_eq!(e.event_id(), id),
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[tokio::test]
    async fn test_dequeue_times_out_when_idle() {
        let (_tx, mut rx) = delivery_queue(MINIMUM_QUEUE_CAPACITY);
        let started = tokio::time::Instant::now();
        let result = rx.dequeue(Duration::from_millis(50)).await;
        assert!(matches!(result, Dequeue::TimedOut));
        assert!(started.elapsed() >= Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_closed_after_senders_dropped() {
        let (tx, mut rx) = delivery_queue(MINIMUM_QUEUE_CAPACITY);
        tx.try_enqueue(Heartbeat::new().into()).unwrap();
        drop(tx);

        assert!(matches!(
            rx.dequeue(Duration::from_secs(1)).await,
            Dequeue::Message(Message::Heartbeat(_))
        ));
        assert!(matches!(
            rx.dequeue(Duration::from_secs(1)).await,
            Dequeue::Closed
        ));
    }

    #[test]
    fn test_enqueue_after_receiver_dropped() {
        let (tx, rx) = delivery_queue(MINIMUM_QUEUE_CAPACITY);
        drop(rx);
        let err = tx.try_enqueue(event(1)).unwrap_err();
        assert!(matches!(err, SasError::ConnectionClosed));
        assert!(!tx.is_discarding());
        assert_eq!(tx.pending_count(), 0);
    }

    #[test]
    fn test_many_producers() {
        let (tx, _rx) = delivery_queue(DEFAULT_QUEUE_CAPACITY);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let tx = tx.clone();
                std::thread::spawn(move || {
                    for id in 0..500 {
                        tx.try_enqueue(event(id)).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(tx.pending_count(), 2000);
    }
}
