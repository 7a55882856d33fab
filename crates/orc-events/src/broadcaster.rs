use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use orc_types::event::EventEnvelope;

use crate::subscriber::{Subscriber, SubscriberId};

const DEFAULT_CAPACITY: usize = 100;

/// The global channel every published event is additionally delivered to,
/// per §4.6's model.
pub const ALL_CHANNEL: &str = "all";

pub fn task_channel(task_id: &str) -> String {
    format!("task:{task_id}")
}

pub fn run_channel(run_id: &str) -> String {
    format!("run:{run_id}")
}

/// An opaque subscription handle. Cheap to clone; all clones refer to the
/// same underlying queue.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Subscriber>,
}

impl Subscription {
    /// Suspends until the next event is available or the subscription is
    /// unsubscribed, in which case this returns `None` forever after.
    pub async fn next(&self) -> Option<EventEnvelope> {
        self.inner.next().await
    }

    /// How many events have been dropped from this subscription's queue due
    /// to backpressure.
    pub fn dropped_count(&self) -> u64 {
        self.inner.dropped_count()
    }

    pub fn id(&self) -> SubscriberId {
        self.inner.id
    }
}

/// In-process publish/subscribe broadcaster (§4.6, C6). `publish` is
/// lock-free from the caller's perspective in the sense that it never
/// blocks on a slow subscriber: each subscriber has its own bounded queue
/// and a full queue just drops its own oldest entry.
pub struct Broadcaster {
    channels: Mutex<HashMap<String, Vec<Arc<Subscriber>>>>,
    next_id: AtomicU64,
    default_capacity: usize,
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

impl Broadcaster {
    pub fn new(default_capacity: usize) -> Self {
        Broadcaster {
            channels: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
            default_capacity,
        }
    }

    /// Registers a new subscription across every channel in `channels`.
    pub fn subscribe(&self, channels: impl IntoIterator<Item = impl Into<String>>) -> Subscription {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let subscriber = Arc::new(Subscriber::new(id, self.default_capacity));

        let mut map = self.channels.lock().expect("broadcaster channel map poisoned");
        for channel in channels {
            map.entry(channel.into()).or_default().push(subscriber.clone());
        }

        Subscription { inner: subscriber }
    }

    /// Idempotent: unsubscribing an already-closed subscription is a no-op.
    /// Remaining queued events are dropped without delivery.
    pub fn unsubscribe(&self, subscription: &Subscription) {
        subscription.inner.close();
        let id = subscription.inner.id;
        let mut map = self.channels.lock().expect("broadcaster channel map poisoned");
        for subs in map.values_mut() {
            subs.retain(|s| s.id != id);
        }
    }

    /// Delivers `event` to its own `task:`/`run:` channels (when present on
    /// the envelope) and unconditionally to [`ALL_CHANNEL`], per §4.6.
    /// Never blocks.
    pub fn publish(&self, event: EventEnvelope) {
        let mut target_channels = vec![ALL_CHANNEL.to_string()];
        if let Some(task_id) = &event.task_id {
            target_channels.push(task_channel(&task_id.to_string()));
        }
        if let Some(run_id) = &event.run_id {
            target_channels.push(run_channel(&run_id.to_string()));
        }

        let map = self.channels.lock().expect("broadcaster channel map poisoned");
        for channel in &target_channels {
            if let Some(subs) = map.get(channel) {
                for sub in subs {
                    sub.push(event.clone());
                }
            }
        }
    }
}
