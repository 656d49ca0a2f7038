use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use uuid::Uuid;

use crate::db::RemoteTable;
use crate::errors::AppError;
use crate::store::Record;

/// Remote table kept in process memory.
///
/// Writes can be made to fail with [`MemoryTable::set_failing`] to exercise rollback.
pub struct MemoryTable<T: Record> {
    rows: RwLock<HashMap<Uuid, Vec<T>>>,
    failing: AtomicBool,
    selects: AtomicUsize,
}

impl<T: Record> Default for MemoryTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Record> MemoryTable<T> {
    pub fn new() -> Self {
        Self {
            rows: RwLock::new(HashMap::new()),
            failing: AtomicBool::new(false),
            selects: AtomicUsize::new(0),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn rows(&self, user_id: Uuid) -> Vec<T> {
        self.rows.read().get(&user_id).cloned().unwrap_or_default()
    }

    /// How many times `select_all` has been called.
    pub fn select_count(&self) -> usize {
        self.selects.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::External("remote backend unavailable".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl<T: Record> RemoteTable<T> for MemoryTable<T> {
    async fn select_all(&self, user_id: Uuid) -> Result<Vec<T>, AppError> {
        self.selects.fetch_add(1, Ordering::SeqCst);
        self.check()?;
        Ok(self.rows(user_id))
    }

    async fn insert(&self, user_id: Uuid, item: &T) -> Result<(), AppError> {
        self.check()?;
        let mut rows = self.rows.write();
        let table = rows.entry(user_id).or_default();
        let key = item.key();
        if !table.iter().any(|existing| existing.key() == key) {
            table.push(item.clone());
        }
        Ok(())
    }

    async fn upsert(&self, user_id: Uuid, item: &T) -> Result<(), AppError> {
        self.check()?;
        let mut rows = self.rows.write();
        let table = rows.entry(user_id).or_default();
        let key = item.key();
        match table.iter_mut().find(|existing| existing.key() == key) {
            Some(slot) => *slot = item.clone(),
            None => table.push(item.clone()),
        }
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, key: &T::Key) -> Result<(), AppError> {
        self.check()?;
        if let Some(table) = self.rows.write().get_mut(&user_id) {
            table.retain(|existing| existing.key() != *key);
        }
        Ok(())
    }
}
