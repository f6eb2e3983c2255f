use crate::config::EnqueuePolicy;
use crate::error::{LedgerError, Result};
use tokio::sync::{Mutex, mpsc};
use tokio::sync::mpsc::error::{TryRecvError, TrySendError};
use tracing::warn;

/// A bounded FIFO shared between request handlers and a worker pool.
///
/// Wraps a `tokio::sync::mpsc` channel. The queue keeps its own sender, so the
/// channel stays open for as long as the queue exists. The receiver sits behind
/// a mutex because several workers dequeue from it.
pub struct WorkQueue<T> {
    name: &'static str,
    policy: EnqueuePolicy,
    sender: mpsc::Sender<T>,
    receiver: Mutex<mpsc::Receiver<T>>,
}

impl<T: Send> WorkQueue<T> {
    /// Creates a queue holding at most `capacity` entries. `capacity` must be non-zero.
    pub fn new(name: &'static str, capacity: usize, policy: EnqueuePolicy) -> Self {
        let (sender, receiver) = mpsc::channel(capacity);
        Self {
            name,
            policy,
            sender,
            receiver: Mutex::new(receiver),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn capacity(&self) -> usize {
        self.sender.max_capacity()
    }

    /// Number of entries currently waiting.
    pub fn len(&self) -> usize {
        self.sender.max_capacity() - self.sender.capacity()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Enqueues following the configured policy: `Block` waits for space,
    /// `Reject` fails with `QueueFull`.
    pub async fn enqueue(&self, item: T) -> Result<()> {
        match self.policy {
            EnqueuePolicy::Block => self
                .sender
                .send(item)
                .await
                .map_err(|_| LedgerError::QueueClosed(self.name)),
            EnqueuePolicy::Reject => self.try_enqueue(item),
        }
    }

    /// Enqueues without waiting, whatever the configured policy.
    pub fn try_enqueue(&self, item: T) -> Result<()> {
        self.sender.try_send(item).map_err(|e| match e {
            TrySendError::Full(_) => {
                warn!(queue = self.name, capacity = self.capacity(), "queue is full");
                LedgerError::QueueFull(self.name)
            }
            TrySendError::Closed(_) => LedgerError::QueueClosed(self.name),
        })
    }

    /// Takes the oldest entry, or `None` if the queue is empty.
    pub async fn try_dequeue(&self) -> Option<T> {
        let mut receiver = self.receiver.lock().await;
        match receiver.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Takes up to `max` entries in FIFO order.
    pub async fn dequeue_batch(&self, max: usize) -> Vec<T> {
        let mut receiver = self.receiver.lock().await;
        let mut batch = Vec::with_capacity(max.min(self.len()));
        while batch.len() < max {
            match receiver.try_recv() {
                Ok(item) => batch.push(item),
                Err(_) => break,
            }
        }
        batch
    }
}
