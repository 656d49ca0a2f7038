use std::fmt::Display;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::store::mutation::Mutation;
use crate::store::storage::LocalStorage;

/// A value kept in a [`PersistedCollection`].
pub trait Record: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    type Key: PartialEq + Clone + Display + Send + Sync;

    fn key(&self) -> Self::Key;

    /// Re-derive computed fields after loading from storage or the remote backend.
    fn normalize(&mut self) {}

    /// Called on the old value when a rollback puts it back in place of `live`.
    fn reconcile(&mut self, _live: &Self) {}
}

/// Ordered in-memory collection mirrored to [`LocalStorage`] after every change.
///
/// The lock is never held across an `.await`; each method is one atomic step.
pub struct PersistedCollection<T: Record> {
    name: &'static str,
    items: RwLock<Vec<T>>,
    storage: Arc<dyn LocalStorage>,
}

impl<T: Record> PersistedCollection<T> {
    pub fn new(name: &'static str, storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            name,
            items: RwLock::new(Vec::new()),
            storage,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Load the last persisted state. Returns how many records were restored.
    pub fn hydrate(&self) -> Result<usize, AppError> {
        let Some(raw) = self.storage.load(self.name)? else {
            return Ok(0);
        };

        let mut loaded: Vec<T> = serde_json::from_str(&raw)?;
        loaded.iter_mut().for_each(|item| item.normalize());
        let count = loaded.len();
        *self.items.write() = loaded;

        debug!("Hydrated {} {} from local storage", count, self.name);
        Ok(count)
    }

    pub fn snapshot(&self) -> Vec<T> {
        self.items.read().clone()
    }

    pub fn len(&self) -> usize {
        self.items.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.read().is_empty()
    }

    pub fn get(&self, key: &T::Key) -> Option<T> {
        self.items.read().iter().find(|item| item.key() == *key).cloned()
    }

    pub fn contains(&self, key: &T::Key) -> bool {
        self.items.read().iter().any(|item| item.key() == *key)
    }

    pub fn insert(&self, item: T) -> Result<Mutation<T>, AppError> {
        let mut items = self.items.write();
        let key = item.key();
        if items.iter().any(|existing| existing.key() == key) {
            return Err(AppError::Conflict(format!("{} already contains {}", self.name, key)));
        }
        items.push(item.clone());
        self.persist(&items);
        Ok(Mutation::Insert(item))
    }

    /// Edit one record through `edit`. The record is untouched if `edit` fails.
    pub fn update<F>(&self, key: &T::Key, edit: F) -> Result<Mutation<T>, AppError>
    where
        F: FnOnce(&mut T) -> Result<(), AppError>,
    {
        let mut items = self.items.write();
        let index = items
            .iter()
            .position(|item| item.key() == *key)
            .ok_or(AppError::NotFound)?;

        let previous = items[index].clone();
        let mut next = previous.clone();
        edit(&mut next)?;
        items[index] = next.clone();
        self.persist(&items);
        Ok(Mutation::Replace { previous, next })
    }

    pub fn remove(&self, key: &T::Key) -> Result<Mutation<T>, AppError> {
        let mut items = self.items.write();
        let index = items
            .iter()
            .position(|item| item.key() == *key)
            .ok_or(AppError::NotFound)?;

        let previous = items.remove(index);
        self.persist(&items);
        Ok(Mutation::Delete { previous, index })
    }

    /// Run `edit` on every record matching `filter` in one step; returns the records
    /// for which `edit` reported a change.
    pub fn update_where<P, F>(&self, filter: P, mut edit: F) -> Vec<T>
    where
        P: Fn(&T) -> bool,
        F: FnMut(&mut T) -> bool,
    {
        let mut items = self.items.write();
        let mut changed = Vec::new();
        for item in items.iter_mut().filter(|item| filter(item)) {
            if edit(item) {
                changed.push(item.clone());
            }
        }
        if !changed.is_empty() {
            self.persist(&items);
        }
        changed
    }

    pub fn replace_all(&self, mut next: Vec<T>) {
        next.iter_mut().for_each(|item| item.normalize());
        let mut items = self.items.write();
        *items = next;
        self.persist(&items);
    }

    pub(crate) fn put(&self, item: T) -> bool {
        let mut items = self.items.write();
        let key = item.key();
        match items.iter_mut().find(|existing| existing.key() == key) {
            Some(slot) => {
                *slot = item;
                self.persist(&items);
                true
            }
            None => false,
        }
    }

    pub(crate) fn put_reconciled(&self, mut item: T) {
        let mut items = self.items.write();
        let key = item.key();
        if let Some(slot) = items.iter_mut().find(|existing| existing.key() == key) {
            item.reconcile(slot);
            *slot = item;
            self.persist(&items);
        }
    }

    pub(crate) fn restore_at(&self, index: usize, item: T) {
        let mut items = self.items.write();
        let key = item.key();
        if items.iter().any(|existing| existing.key() == key) {
            return;
        }
        let index = index.min(items.len());
        items.insert(index, item);
        self.persist(&items);
    }

    pub(crate) fn discard(&self, key: &T::Key) -> Option<T> {
        let mut items = self.items.write();
        let index = items.iter().position(|item| item.key() == *key)?;
        let removed = items.remove(index);
        self.persist(&items);
        Some(removed)
    }

    // A failed local write leaves the in-memory state as the source of truth; the
    // next successful mutation rewrites the whole collection anyway.
    fn persist(&self, items: &[T]) {
        let result = serde_json::to_string(items)
            .map_err(AppError::from)
            .and_then(|json| self.storage.save(self.name, &json));
        if let Err(e) = result {
            warn!("Failed to write {} to local storage: {}", self.name, e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: u32,
        label: String,
    }

    impl Record for Item {
        type Key = u32;

        fn key(&self) -> u32 {
            self.id
        }
    }

    fn item(id: u32, label: &str) -> Item {
        Item { id, label: label.to_string() }
    }

    #[test]
    fn test_every_mutation_writes_through() {
        let storage = Arc::new(MemoryStorage::new());
        let collection = PersistedCollection::<Item>::new("items", storage.clone());

        collection.insert(item(1, "one")).unwrap();
        collection.insert(item(2, "two")).unwrap();
        collection.remove(&1).unwrap();

        let saved: Vec<Item> = serde_json::from_str(&storage.load("items").unwrap().unwrap()).unwrap();
        assert_eq!(saved, vec![item(2, "two")]);
    }

    #[test]
    fn test_duplicate_insert_is_conflict() {
        let collection = PersistedCollection::<Item>::new("items", Arc::new(MemoryStorage::new()));
        collection.insert(item(1, "one")).unwrap();

        let err = collection.insert(item(1, "again")).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
        assert_eq!(collection.len(), 1);
    }

    #[test]
    fn test_failed_edit_leaves_record_untouched() {
        let collection = PersistedCollection::<Item>::new("items", Arc::new(MemoryStorage::new()));
        collection.insert(item(1, "one")).unwrap();

        let result = collection.update(&1, |it| {
            it.label = "changed".into();
            Err(AppError::Validation("nope".into()))
        });

        assert!(result.is_err());
        assert_eq!(collection.get(&1).unwrap().label, "one");
    }

    #[test]
    fn test_hydrate_restores_persisted_state() {
        let storage: Arc<dyn LocalStorage> =
            Arc::new(MemoryStorage::with_entry("items", r#"[{"id":7,"label":"seven"}]"#));
        let collection = PersistedCollection::<Item>::new("items", storage);

        assert_eq!(collection.hydrate().unwrap(), 1);
        assert_eq!(collection.get(&7), Some(item(7, "seven")));
    }

    #[test]
    fn test_hydrate_rejects_malformed_state() {
        let storage: Arc<dyn LocalStorage> = Arc::new(MemoryStorage::with_entry("items", "{oops"));
        let collection = PersistedCollection::<Item>::new("items", storage);

        assert!(collection.hydrate().is_err());
        assert!(collection.is_empty());
    }
}
