//! In-memory registries for items and metadata.
//!
//! Both registries keep the whole model in process. Mutations notify
//! registered listeners synchronously; the item registry additionally
//! publishes lifecycle events on the bus.

use std::sync::{Arc, Mutex, PoisonError};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use hearth_domain::error::{HearthError, NotFoundError, ValidationError};
use hearth_domain::id::ItemName;
use hearth_domain::item::Item;
use hearth_domain::item::events::ItemEventFactory;
use hearth_domain::metadata::{Metadata, MetadataKey};

use crate::ports::{EventPublisher, ItemRegistry, MetadataRegistry, RegistryListener};

/// Item registry backed by a concurrent map.
pub struct InMemoryItemRegistry {
    items: DashMap<ItemName, Item>,
    listeners: Mutex<Vec<Arc<dyn RegistryListener<Item>>>>,
    publisher: Arc<dyn EventPublisher>,
    factory: ItemEventFactory,
}

impl InMemoryItemRegistry {
    #[must_use]
    pub fn new(publisher: Arc<dyn EventPublisher>, factory: ItemEventFactory) -> Self {
        Self {
            items: DashMap::new(),
            listeners: Mutex::new(Vec::new()),
            publisher,
            factory,
        }
    }

    /// Register a listener; it sees mutations made after this call.
    pub fn add_listener(&self, listener: Arc<dyn RegistryListener<Item>>) {
        self.listeners_lock().push(listener);
    }

    /// Add a new item.
    ///
    /// # Errors
    ///
    /// [`ValidationError::AlreadyRegistered`] when the name is taken.
    pub fn add(&self, item: Item) -> Result<(), HearthError> {
        match self.items.entry(item.name.clone()) {
            Entry::Occupied(_) => {
                return Err(ValidationError::AlreadyRegistered {
                    entity: "item",
                    name: item.name.to_string(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(item.clone());
            }
        }
        for listener in self.listeners_snapshot() {
            listener.added(&item);
        }
        self.publisher.post(self.factory.added_event(&item));
        Ok(())
    }

    /// Replace an existing item, returning the previous version.
    ///
    /// # Errors
    ///
    /// [`NotFoundError`] when no item with that name is registered.
    pub fn update(&self, item: Item) -> Result<Item, HearthError> {
        let old = match self.items.entry(item.name.clone()) {
            Entry::Occupied(mut slot) => slot.insert(item.clone()),
            Entry::Vacant(_) => {
                return Err(NotFoundError::item(item.name.as_str()).into());
            }
        };
        for listener in self.listeners_snapshot() {
            listener.updated(&old, &item);
        }
        self.publisher.post(self.factory.updated_event(&item, &old));
        Ok(old)
    }

    /// Remove the named item, returning it.
    ///
    /// # Errors
    ///
    /// [`NotFoundError`] when no item with that name is registered.
    pub fn remove(&self, name: &ItemName) -> Result<Item, HearthError> {
        let (_, item) = self
            .items
            .remove(name)
            .ok_or_else(|| NotFoundError::item(name.as_str()))?;
        for listener in self.listeners_snapshot() {
            listener.removed(&item);
        }
        self.publisher.post(self.factory.removed_event(&item));
        Ok(item)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn listeners_lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<dyn RegistryListener<Item>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    // Listeners run outside the lock so they may touch the registry.
    fn listeners_snapshot(&self) -> Vec<Arc<dyn RegistryListener<Item>>> {
        self.listeners_lock().clone()
    }
}

impl ItemRegistry for InMemoryItemRegistry {
    fn get(&self, name: &ItemName) -> Result<Item, HearthError> {
        self.items
            .get(name)
            .map(|entry| entry.clone())
            .ok_or_else(|| NotFoundError::item(name.as_str()).into())
    }
}

/// Metadata registry backed by a concurrent map.
pub struct InMemoryMetadataRegistry {
    records: DashMap<MetadataKey, Metadata>,
    listeners: Mutex<Vec<Arc<dyn RegistryListener<Metadata>>>>,
}

impl InMemoryMetadataRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            records: DashMap::new(),
            listeners: Mutex::new(Vec::new()),
        }
    }

    /// Register a listener; it sees mutations made after this call.
    pub fn add_listener(&self, listener: Arc<dyn RegistryListener<Metadata>>) {
        self.listeners_lock().push(listener);
    }

    /// Add a new metadata record.
    ///
    /// # Errors
    ///
    /// [`ValidationError::AlreadyRegistered`] when the key is taken.
    pub fn add(&self, metadata: Metadata) -> Result<(), HearthError> {
        match self.records.entry(metadata.key.clone()) {
            Entry::Occupied(_) => {
                return Err(ValidationError::AlreadyRegistered {
                    entity: "metadata",
                    name: metadata.key.to_string(),
                }
                .into());
            }
            Entry::Vacant(slot) => {
                slot.insert(metadata.clone());
            }
        }
        for listener in self.listeners_snapshot() {
            listener.added(&metadata);
        }
        Ok(())
    }

    /// Replace an existing record, returning the previous version.
    ///
    /// # Errors
    ///
    /// [`NotFoundError`] when no record exists under that key.
    pub fn update(&self, metadata: Metadata) -> Result<Metadata, HearthError> {
        let old = match self.records.entry(metadata.key.clone()) {
            Entry::Occupied(mut slot) => slot.insert(metadata.clone()),
            Entry::Vacant(_) => {
                return Err(NotFoundError::metadata(metadata.key.to_string()).into());
            }
        };
        for listener in self.listeners_snapshot() {
            listener.updated(&old, &metadata);
        }
        Ok(old)
    }

    /// Remove the record under `key`, returning it.
    ///
    /// # Errors
    ///
    /// [`NotFoundError`] when no record exists under that key.
    pub fn remove(&self, key: &MetadataKey) -> Result<Metadata, HearthError> {
        let (_, metadata) = self
            .records
            .remove(key)
            .ok_or_else(|| NotFoundError::metadata(key.to_string()))?;
        for listener in self.listeners_snapshot() {
            listener.removed(&metadata);
        }
        Ok(metadata)
    }

    fn listeners_lock(
        &self,
    ) -> std::sync::MutexGuard<'_, Vec<Arc<dyn RegistryListener<Metadata>>>> {
        self.listeners.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn listeners_snapshot(&self) -> Vec<Arc<dyn RegistryListener<Metadata>>> {
        self.listeners_lock().clone()
    }
}

impl Default for InMemoryMetadataRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetadataRegistry for InMemoryMetadataRegistry {
    fn get(&self, key: &MetadataKey) -> Option<Metadata> {
        self.records.get(key).map(|entry| entry.clone())
    }
}
