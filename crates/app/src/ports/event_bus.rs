//! Event bus ports — publish/subscribe for events.

use std::collections::HashSet;

use hearth_domain::error::HearthError;
use hearth_domain::event::Event;

/// Consumes events delivered by the bus.
///
/// Dispatch is synchronous on the publisher's thread, so implementations
/// must tolerate being called from any thread and should return quickly.
pub trait EventSubscriber: Send + Sync {
    /// Handle one event.
    ///
    /// # Errors
    ///
    /// Implementations may fail per event; the bus logs the failure and
    /// keeps delivering to the remaining subscribers.
    fn receive(&self, event: &Event) -> Result<(), HearthError>;
}

/// Publishes events to all registered subscribers.
pub trait EventPublisher: Send + Sync {
    /// Deliver `event` to every matching subscriber before returning.
    fn post(&self, event: Event);
}

impl<T: EventPublisher + ?Sized> EventPublisher for std::sync::Arc<T> {
    fn post(&self, event: Event) {
        (**self).post(event);
    }
}

/// The event types a subscription is interested in.
#[derive(Debug, Clone)]
pub enum SubscribedTypes {
    /// Every event, regardless of type.
    All,
    /// Only the named event types.
    Only(HashSet<String>),
}

impl SubscribedTypes {
    #[must_use]
    pub fn all() -> Self {
        Self::All
    }

    pub fn of<I>(types: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self::Only(types.into_iter().map(Into::into).collect())
    }

    #[must_use]
    pub fn accepts(&self, event_type: &str) -> bool {
        match self {
            Self::All => true,
            Self::Only(types) => types.contains(event_type),
        }
    }
}
