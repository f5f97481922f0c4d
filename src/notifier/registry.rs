use std::collections::HashMap;
use std::fmt::Display;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc::{self, error::TrySendError};
use tracing::{debug, warn};

use super::error::ChannelError;

/// Anything that can fan a text event out to observers.
///
/// Implementations are fire-and-forget: they never block on a slow observer and never report
/// delivery failures to the caller.
pub trait Broadcast: Send + Sync {
    fn broadcast(&self, message: &str);
}

/// Identifier of one connected observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(pub u64);

impl Display for ObserverId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "observer_{}", self.0)
    }
}

struct ObserverChannel {
    peer: SocketAddr,
    queue: mpsc::Sender<Arc<str>>,
}

struct Registry {
    observers: Mutex<HashMap<ObserverId, ObserverChannel>>,
    next_id: AtomicU64,
    queue_capacity: usize,
}

/// The set of connected observers and the broadcast entry point.
///
/// Every observer gets a bounded queue drained by its own connection task, so a broadcast is
/// only a round of non-blocking enqueues under a short lock. Events reach each observer in
/// broadcast order.
#[derive(Clone)]
pub struct Notifier {
    inner: Arc<Registry>,
}

impl Notifier {
    pub fn new(queue_capacity: usize) -> Self {
        Self {
            inner: Arc::new(Registry {
                observers: Mutex::new(HashMap::new()),
                next_id: AtomicU64::new(1),
                queue_capacity: queue_capacity.max(1),
            }),
        }
    }

    fn observers(&self) -> MutexGuard<'_, HashMap<ObserverId, ObserverChannel>> {
        // Entries stay consistent even if a holder panicked; keep serving.
        self.inner
            .observers
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Adds an observer and returns the queue its connection task must drain.
    pub fn register(&self, peer: SocketAddr) -> (ObserverId, mpsc::Receiver<Arc<str>>) {
        let id = ObserverId(self.inner.next_id.fetch_add(1, Ordering::SeqCst));
        let (queue, receiver) = mpsc::channel(self.inner.queue_capacity);
        self.observers().insert(id, ObserverChannel { peer, queue });
        (id, receiver)
    }

    /// Removes an observer. Unknown ids are ignored.
    pub fn deregister(&self, id: ObserverId) {
        self.observers().remove(&id);
    }

    pub fn observer_count(&self) -> usize {
        self.observers().len()
    }

    /// Queues `message` for every registered observer.
    ///
    /// Observers whose queue is closed or full are deregistered on the spot.
    pub fn broadcast(&self, message: &str) {
        let message: Arc<str> = Arc::from(message);
        let mut observers = self.observers();
        observers.retain(|id, channel| match channel.queue.try_send(message.clone()) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                warn!(observer = %id, peer = %channel.peer, error = %ChannelError::Lagging, "Dropping observer");
                false
            }
            Err(TrySendError::Closed(_)) => {
                debug!(observer = %id, peer = %channel.peer, error = %ChannelError::Closed, "Dropping observer");
                false
            }
        });
        debug!(observers = observers.len(), %message, "Broadcast");
    }
}

impl Broadcast for Notifier {
    fn broadcast(&self, message: &str) {
        Notifier::broadcast(self, message);
    }
}
