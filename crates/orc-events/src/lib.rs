//! # orc-events
//!
//! In-process publish/subscribe event broadcaster (§4.6, C6): named
//! channels (`task:<id>`, `run:<id>`, `all`), bounded per-subscriber queues
//! with drop-oldest backpressure, at-most-once in-process delivery.
//!
//! There is no persistence layer here by design — a restart loses
//! undelivered events, matching the spec's delivery-semantics contract.

mod broadcaster;
mod subscriber;

pub use broadcaster::{run_channel, task_channel, Broadcaster, Subscription, ALL_CHANNEL};
pub use subscriber::SubscriberId;
