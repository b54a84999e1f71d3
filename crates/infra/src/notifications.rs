//! Post-commit lifecycle notifications.
//!
//! Runs only after the store accepted a commit. Delivery is best-effort: a
//! failing bus is logged and otherwise ignored, the committed state stands.

use plates_catalog::{PlateEvent, AGGREGATE_TYPE};
use plates_events::{EventBus, EventEnvelope};

/// Message type carried on the lifecycle bus.
pub type LifecycleMessage = EventEnvelope<PlateEvent>;

/// Publishes plate lifecycle changes to an [`EventBus`].
#[derive(Debug)]
pub struct LifecycleNotifier<B> {
    bus: B,
    notify_on_unreserve: bool,
}

impl<B> LifecycleNotifier<B> {
    pub fn new(bus: B, notify_on_unreserve: bool) -> Self {
        Self {
            bus,
            notify_on_unreserve,
        }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Reserve and sell always notify; unreserve only when enabled.
    pub fn should_notify(&self, event: &PlateEvent) -> bool {
        match event {
            PlateEvent::PlateReserved(_) | PlateEvent::PlateSold(_) => true,
            PlateEvent::PlateUnreserved(_) => self.notify_on_unreserve,
        }
    }
}

impl<B> LifecycleNotifier<B>
where
    B: EventBus<LifecycleMessage>,
{
    /// Publish `event`, produced by the commit that moved the plate to `version`.
    ///
    /// Returns whether a message was handed to the bus.
    pub fn notify(&self, version: u64, event: PlateEvent) -> bool {
        if !self.should_notify(&event) {
            return false;
        }

        let plate_id = event.plate_id();
        let message = EventEnvelope::wrap(plate_id.0, AGGREGATE_TYPE, version, event);
        let event_id = message.event_id();

        match self.bus.publish(message) {
            Ok(()) => {
                tracing::debug!(%plate_id, %event_id, "lifecycle notification published");
                true
            }
            Err(err) => {
                tracing::warn!(
                    %plate_id,
                    %event_id,
                    error = ?err,
                    "lifecycle notification failed; committed change stands"
                );
                false
            }
        }
    }
}
