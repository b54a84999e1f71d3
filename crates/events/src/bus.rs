//! Event publishing/subscription abstraction (mechanics only).
//!
//! The bus is how lifecycle notifications leave the catalog after a commit.
//! It makes minimal assumptions:
//!
//! - **Transport-agnostic**: in-memory channels, a broker client, an outbox table.
//! - **Best-effort**: the store is the source of truth; a failed publish never
//!   undoes a committed change.
//! - **At-least-once**: consumers must tolerate duplicates (use `event_id`).

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError};

/// A subscription to an event stream.
///
/// Each subscription gets a copy of every message published after it was
/// created (broadcast semantics). Intended for a single consuming thread.
#[derive(Debug)]
pub struct Subscription<M> {
    receiver: Receiver<M>,
}

impl<M> Subscription<M> {
    pub fn new(receiver: Receiver<M>) -> Self {
        Self { receiver }
    }

    /// Try to receive a message without blocking.
    pub fn try_recv(&self) -> Result<M, TryRecvError> {
        self.receiver.try_recv()
    }

    /// Drain everything currently buffered without blocking.
    pub fn drain(&self) -> Vec<M> {
        self.receiver.try_iter().collect()
    }
}

/// Domain-agnostic event bus (pub/sub abstraction).
///
/// ```text
/// Command → Store (commit) → EventBus (publish) → Consumers
/// ```
///
/// `publish()` can fail (bus closed, broker unreachable). Callers that treat
/// publication as fire-and-forget log the error and move on.
///
/// Implementations must be `Send + Sync`; multiple threads publish concurrently.
pub trait EventBus<M>: Send + Sync {
    type Error: core::fmt::Debug + Send + Sync + 'static;

    fn publish(&self, message: M) -> Result<(), Self::Error>;

    fn subscribe(&self) -> Subscription<M>;
}

impl<M, B> EventBus<M> for Arc<B>
where
    B: EventBus<M> + ?Sized,
{
    type Error = B::Error;

    fn publish(&self, message: M) -> Result<(), Self::Error> {
        (**self).publish(message)
    }

    fn subscribe(&self) -> Subscription<M> {
        (**self).subscribe()
    }
}
