//! Registry ports — lookups and change notifications for the model.

use hearth_domain::error::HearthError;
use hearth_domain::id::ItemName;
use hearth_domain::item::Item;
use hearth_domain::metadata::{Metadata, MetadataKey};

/// Read access to the item registry.
pub trait ItemRegistry: Send + Sync {
    /// Look up an item by name.
    ///
    /// # Errors
    ///
    /// [`NotFoundError`](hearth_domain::error::NotFoundError) when no item
    /// with that name is registered.
    fn get(&self, name: &ItemName) -> Result<Item, HearthError>;
}

/// Read access to the metadata registry. Absence is not an error.
pub trait MetadataRegistry: Send + Sync {
    fn get(&self, key: &MetadataKey) -> Option<Metadata>;
}

/// Observes element lifecycle in a registry.
///
/// Notifications run synchronously inside the mutating call.
pub trait RegistryListener<T>: Send + Sync {
    fn added(&self, element: &T);
    fn removed(&self, element: &T);
    fn updated(&self, old: &T, element: &T);
}
