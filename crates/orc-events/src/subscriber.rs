use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Mutex;

use orc_types::event::EventEnvelope;
use tokio::sync::Notify;

/// Opaque per-subscriber id, unique for the lifetime of the process.
pub type SubscriberId = u64;

/// One subscriber's bounded FIFO queue (§4.6: default capacity 100,
/// drop-oldest backpressure). `publish` never blocks on this: pushing past
/// capacity evicts the oldest queued event and bumps `dropped`.
pub(crate) struct Subscriber {
    pub id: SubscriberId,
    queue: Mutex<VecDeque<EventEnvelope>>,
    capacity: usize,
    dropped: AtomicU64,
    closed: AtomicBool,
    notify: Notify,
}

impl Subscriber {
    pub fn new(id: SubscriberId, capacity: usize) -> Self {
        Subscriber {
            id,
            queue: Mutex::new(VecDeque::with_capacity(capacity.min(1024))),
            capacity,
            dropped: AtomicU64::new(0),
            closed: AtomicBool::new(false),
            notify: Notify::new(),
        }
    }

    pub fn push(&self, event: EventEnvelope) {
        if self.closed.load(Ordering::Acquire) {
            return;
        }
        let mut queue = self.queue.lock().expect("subscriber queue mutex poisoned");
        if queue.len() >= self.capacity {
            queue.pop_front();
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        queue.push_back(event);
        drop(queue);
        self.notify.notify_one();
    }

    /// Suspends until an event is available, the subscriber is closed, or a
    /// spurious wakeup happens (handled by re-checking the queue in a loop).
    pub async fn next(&self) -> Option<EventEnvelope> {
        loop {
            if let Some(event) = self.queue.lock().expect("subscriber queue mutex poisoned").pop_front() {
                return Some(event);
            }
            if self.closed.load(Ordering::Acquire) {
                return None;
            }
            self.notify.notified().await;
        }
    }

    /// Idempotent: subsequent calls are no-ops. Drains remaining events
    /// without delivering them, per §4.6's `unsubscribe` contract.
    pub fn close(&self) {
        self.closed.store(true, Ordering::Release);
        self.queue.lock().expect("subscriber queue mutex poisoned").clear();
        self.notify.notify_waiters();
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}
