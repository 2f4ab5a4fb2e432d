//! Expire manager — reverts item state when its expiry timer runs out.
//!
//! The manager watches item events, arms one deadline per item according to
//! the item's `expire` metadata, and posts the configured command or state
//! once the deadline passes with no further activity. Parse results are
//! cached per item, including misses; registry changes evict the cache.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use tokio::task::JoinHandle;

use hearth_domain::error::HearthError;
use hearth_domain::event::Event;
use hearth_domain::expire::{ExpireAction, ExpireConfig, METADATA_NAMESPACE};
use hearth_domain::id::ItemName;
use hearth_domain::item::Item;
use hearth_domain::item::events::{self, ItemEvent, ItemEventFactory};
use hearth_domain::metadata::{Metadata, MetadataKey};
use hearth_domain::value::Value;

use crate::ports::{
    EventPublisher, EventSubscriber, ItemRegistry, MetadataRegistry, RegistryListener,
    SubscribedTypes,
};

/// Source name stamped on every event the manager posts.
pub const EVENT_SOURCE: &str = "hearth.expire";

const TICK_PERIOD: Duration = Duration::from_secs(1);

/// Watches item activity and expires stale state.
///
/// Register it on the bus for [`subscribed_types`](Self::subscribed_types)
/// and as listener on the item and metadata registries, then call
/// [`activate`](Self::activate) to start the timer.
pub struct ExpireManager {
    publisher: Arc<dyn EventPublisher>,
    items: Arc<dyn ItemRegistry>,
    metadata: Arc<dyn MetadataRegistry>,
    factory: ItemEventFactory,
    /// Parse result per item; `None` records the absence of a usable config.
    configs: DashMap<ItemName, Option<ExpireConfig>>,
    deadlines: DashMap<ItemName, Instant>,
    active: AtomicBool,
    tick_task: Mutex<Option<JoinHandle<()>>>,
}

impl ExpireManager {
    #[must_use]
    pub fn new(
        publisher: Arc<dyn EventPublisher>,
        items: Arc<dyn ItemRegistry>,
        metadata: Arc<dyn MetadataRegistry>,
        factory: ItemEventFactory,
    ) -> Arc<Self> {
        Arc::new(Self {
            publisher,
            items,
            metadata,
            factory,
            configs: DashMap::new(),
            deadlines: DashMap::new(),
            active: AtomicBool::new(true),
            tick_task: Mutex::new(None),
        })
    }

    /// The event types the manager needs from the bus.
    #[must_use]
    pub fn subscribed_types() -> SubscribedTypes {
        SubscribedTypes::of([
            events::ITEM_STATE_EVENT,
            events::ITEM_COMMAND_EVENT,
            events::ITEM_STATE_CHANGED_EVENT,
            events::GROUP_ITEM_STATE_CHANGED_EVENT,
        ])
    }

    /// Start the reconciliation timer. Calling twice is harmless.
    ///
    /// Must run inside a tokio runtime.
    pub fn activate(self: &Arc<Self>) {
        self.active.store(true, Ordering::SeqCst);
        let mut task = self.tick_task_lock();
        if task.is_some() {
            return;
        }
        let manager = Arc::clone(self);
        *task = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK_PERIOD);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                manager.tick(Instant::now());
            }
        }));
    }

    /// Stop the timer and drop every armed deadline.
    ///
    /// Cached configurations survive, so a later [`activate`](Self::activate)
    /// starts warm. Events received while inactive are ignored.
    pub fn deactivate(&self) {
        self.active.store(false, Ordering::SeqCst);
        if let Some(task) = self.tick_task_lock().take() {
            task.abort();
        }
        self.deadlines.clear();
    }

    /// One reconciliation pass: fire every deadline before `now`.
    fn tick(&self, now: Instant) {
        if self.deadlines.is_empty() {
            return;
        }
        let armed: Vec<(ItemName, ExpireConfig)> = self
            .configs
            .iter()
            .filter_map(|entry| {
                entry
                    .value()
                    .as_ref()
                    .map(|config| (entry.key().clone(), config.clone()))
            })
            .collect();
        for (name, config) in armed {
            if self
                .deadlines
                .remove_if(&name, |_, deadline| *deadline < now)
                .is_some()
            {
                self.expire(&name, &config);
            }
        }
    }

    fn expire(&self, name: &ItemName, config: &ExpireConfig) {
        match &config.action {
            ExpireAction::Command(value) => {
                tracing::debug!(item = %name, %value, "no activity within the expire duration, posting command");
                self.publisher
                    .post(self.factory.command_event(name, value, Some(EVENT_SOURCE)));
            }
            ExpireAction::State(value) => {
                tracing::debug!(item = %name, %value, "no activity within the expire duration, posting state update");
                self.publisher
                    .post(self.factory.state_event(name, value, Some(EVENT_SOURCE)));
            }
        }
    }

    /// Cached config lookup. Misses are cached too, so an item without
    /// usable expire metadata costs one registry round trip, not one per
    /// event.
    fn config_for(&self, name: &ItemName) -> Option<ExpireConfig> {
        if let Some(cached) = self.configs.get(name) {
            return cached.clone();
        }
        let config = self.load_config(name);
        self.configs.insert(name.clone(), config.clone());
        config
    }

    fn load_config(&self, name: &ItemName) -> Option<ExpireConfig> {
        let key = MetadataKey::new(METADATA_NAMESPACE, name.clone());
        let metadata = self.metadata.get(&key)?;
        let item = match self.items.get(name) {
            Ok(item) => item,
            Err(err) => {
                tracing::debug!(item = %name, %err, "item not registered, no expire config for now");
                return None;
            }
        };
        match ExpireConfig::parse(
            &item,
            &metadata.value,
            &metadata.configuration,
            self.factory.codec(),
        ) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!(item = %name, value = %metadata.value, %err, "ignoring invalid expire metadata");
                None
            }
        }
    }

    /// Re-arm or disarm the item's deadline after observing `observed`.
    fn apply(&self, name: &ItemName, config: &ExpireConfig, observed: &Value) {
        if config.action.value() == observed {
            tracing::trace!(item = %name, "item already carries its expired value, timer disarmed");
            self.deadlines.remove(name);
        } else {
            match Instant::now().checked_add(config.duration) {
                Some(deadline) => {
                    tracing::trace!(item = %name, after = ?config.duration, "expiry timer armed");
                    self.deadlines.insert(name.clone(), deadline);
                }
                None => {
                    tracing::warn!(
                        item = %name,
                        after = ?config.duration,
                        "expire duration overflows the clock, leaving the timer disarmed"
                    );
                    self.deadlines.remove(name);
                }
            }
        }
    }

    fn tick_task_lock(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.tick_task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl EventSubscriber for ExpireManager {
    fn receive(&self, event: &Event) -> Result<(), HearthError> {
        if !self.active.load(Ordering::SeqCst) {
            return Ok(());
        }
        match self.factory.parse(event)? {
            ItemEvent::State { item_name, value } => {
                if let Some(config) = self.config_for(&item_name) {
                    if !config.ignore_state_updates {
                        self.apply(&item_name, &config, &value);
                    }
                }
            }
            ItemEvent::Command { item_name, value } => {
                if let Some(config) = self.config_for(&item_name) {
                    if !config.ignore_commands {
                        self.apply(&item_name, &config, &value);
                    }
                }
            }
            // state changes always count as activity, whatever the flags say
            ItemEvent::StateChanged {
                item_name, value, ..
            }
            | ItemEvent::GroupStateChanged {
                item_name, value, ..
            } => {
                if let Some(config) = self.config_for(&item_name) {
                    self.apply(&item_name, &config, &value);
                }
            }
            ItemEvent::Added { .. } | ItemEvent::Removed { .. } | ItemEvent::Updated { .. } => {}
        }
        Ok(())
    }
}

impl RegistryListener<Item> for ExpireManager {
    fn added(&self, element: &Item) {
        self.configs.remove(&element.name);
    }

    fn removed(&self, element: &Item) {
        self.configs.remove(&element.name);
    }

    fn updated(&self, old: &Item, element: &Item) {
        self.configs.remove(&old.name);
        self.configs.remove(&element.name);
    }
}

impl RegistryListener<Metadata> for ExpireManager {
    fn added(&self, element: &Metadata) {
        self.evict_for(&element.key);
    }

    fn removed(&self, element: &Metadata) {
        self.evict_for(&element.key);
    }

    fn updated(&self, _old: &Metadata, element: &Metadata) {
        self.evict_for(&element.key);
    }
}

impl ExpireManager {
    fn evict_for(&self, key: &MetadataKey) {
        if key.namespace == METADATA_NAMESPACE {
            self.configs.remove(&key.item_name);
        }
    }
}
