//! In-process event bus with synchronous, isolated dispatch.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use dashmap::DashMap;

use hearth_domain::event::Event;
use hearth_domain::id::SubscriptionId;
use hearth_domain::topic::TopicFilter;

use crate::ports::{EventPublisher, EventSubscriber, SubscribedTypes};

/// In-process event bus.
///
/// Delivery is synchronous: `publish` runs every matching subscriber on the
/// calling thread before it returns, so two events published in order by one
/// thread arrive in that order at every subscriber. A failing or panicking
/// subscriber is logged and skipped; it never stops delivery to the rest.
pub struct EventBus {
    subscriptions: DashMap<SubscriptionId, Subscription>,
}

struct Subscription {
    subscriber: Arc<dyn EventSubscriber>,
    types: SubscribedTypes,
    filter: Option<TopicFilter>,
}

impl EventBus {
    #[must_use]
    pub fn new() -> Self {
        Self {
            subscriptions: DashMap::new(),
        }
    }

    /// Register a subscriber for the given event types and topic filter.
    ///
    /// Returns the id to unregister with. The subscriber sees events
    /// published after this call.
    pub fn register(
        &self,
        subscriber: Arc<dyn EventSubscriber>,
        types: SubscribedTypes,
        filter: Option<TopicFilter>,
    ) -> SubscriptionId {
        let id = SubscriptionId::new();
        self.subscriptions.insert(
            id,
            Subscription {
                subscriber,
                types,
                filter,
            },
        );
        id
    }

    /// Drop a subscription. Returns whether it existed.
    pub fn unregister(&self, id: SubscriptionId) -> bool {
        self.subscriptions.remove(&id).is_some()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Deliver `event` to every matching subscriber before returning.
    ///
    /// The subscriber set is snapshotted up front: registrations and
    /// removals racing with a publish take effect for the next event, and a
    /// subscriber may freely register, unregister, or publish from inside
    /// its own `receive`.
    pub fn publish(&self, event: &Event) {
        let matching: Vec<Arc<dyn EventSubscriber>> = self
            .subscriptions
            .iter()
            .filter(|entry| {
                entry.types.accepts(&event.event_type)
                    && entry
                        .filter
                        .as_ref()
                        .is_none_or(|filter| filter.accepts(event))
            })
            .map(|entry| Arc::clone(&entry.subscriber))
            .collect();

        for subscriber in matching {
            match catch_unwind(AssertUnwindSafe(|| subscriber.receive(event))) {
                Ok(Ok(())) => {}
                Ok(Err(err)) => {
                    tracing::error!(%err, topic = %event.topic, "subscriber failed to handle event");
                }
                Err(_) => {
                    tracing::error!(topic = %event.topic, "subscriber panicked while handling event");
                }
            }
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventPublisher for EventBus {
    fn post(&self, event: Event) {
        self.publish(&event);
    }
}
