//! # hearth-app
//!
//! Application layer — the event bus, in-memory registries, and the
//! event-driven services built on them.
//!
//! ## Responsibilities
//! - Define **port traits** that components implement:
//!   - `EventSubscriber` / `EventPublisher` — synchronous publish/subscribe
//!   - `ItemRegistry` / `MetadataRegistry` — model lookups
//!   - `RegistryListener` — registry change notifications
//!   - `TriggerCallback` — trigger firings toward the rule engine
//! - Provide **in-process infrastructure** that doesn't need IO:
//!   - `EventBus` — subscriber registry with isolated, in-order dispatch
//!   - `InMemoryItemRegistry` / `InMemoryMetadataRegistry`
//! - Provide the **event-driven services**:
//!   - `ExpireManager` — reverts stale item state per `expire` metadata
//!   - `ThingStatusTriggerHandler` — fires rule triggers on thing status events
//!
//! ## Dependency rule
//! Depends on `hearth-domain` only (plus `tokio` for the background timer).
//! Never imports the binary crate. The composition root depends on *this*
//! crate, not the reverse.

pub mod event_bus;
pub mod expire_manager;
pub mod ports;
pub mod registry;
pub mod trigger_handler;
