//! Port definitions — traits that components implement.
//!
//! Ports are the boundaries between the application core and the outside world.
//! They are defined here (in `app`) so that both the service layer and the
//! composition root can depend on them without creating circular dependencies.

pub mod event_bus;
pub mod registry;
pub mod rule_engine;

pub use event_bus::{EventPublisher, EventSubscriber, SubscribedTypes};
pub use registry::{ItemRegistry, MetadataRegistry, RegistryListener};
pub use rule_engine::{TriggerCallback, TriggerOutput};
