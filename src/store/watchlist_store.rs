use std::sync::Arc;

use crate::errors::AppError;
use crate::models::WatchlistEntry;
use crate::store::collection::{PersistedCollection, Record};
use crate::store::mutation::Mutation;
use crate::store::storage::LocalStorage;
use crate::utils::parse_symbol;

impl Record for WatchlistEntry {
    type Key = String;

    fn key(&self) -> String {
        self.symbol.clone()
    }
}

pub struct WatchlistStore {
    entries: PersistedCollection<WatchlistEntry>,
}

impl WatchlistStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            entries: PersistedCollection::new("watchlist", storage),
        }
    }

    pub fn collection(&self) -> &PersistedCollection<WatchlistEntry> {
        &self.entries
    }

    pub fn hydrate(&self) -> Result<usize, AppError> {
        self.entries.hydrate()
    }

    pub fn entries(&self) -> Vec<WatchlistEntry> {
        self.entries.snapshot()
    }

    pub fn symbols(&self) -> Vec<String> {
        self.entries.snapshot().into_iter().map(|e| e.symbol).collect()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.entries.contains(&symbol.to_string())
    }

    pub fn add(&self, symbol: &str) -> Result<Mutation<WatchlistEntry>, AppError> {
        let symbol = parse_symbol(symbol)?;
        self.entries.insert(WatchlistEntry::new(&symbol))
    }

    pub fn remove(&self, symbol: &str) -> Result<Mutation<WatchlistEntry>, AppError> {
        let symbol = parse_symbol(symbol)?;
        self.entries.remove(&symbol)
    }

    pub fn replace_from_remote(&self, remote: Vec<WatchlistEntry>) {
        self.entries.replace_all(remote);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::storage::MemoryStorage;

    #[test]
    fn test_watchlist_is_unique_and_ordered() {
        let store = WatchlistStore::new(Arc::new(MemoryStorage::new()));
        store.add("tsla").unwrap();
        store.add("AAPL").unwrap();
        store.add("msft").unwrap();

        assert!(matches!(store.add("TSLA"), Err(AppError::Conflict(_))));
        assert_eq!(store.symbols(), vec!["TSLA", "AAPL", "MSFT"]);

        store.remove("aapl").unwrap();
        assert_eq!(store.symbols(), vec!["TSLA", "MSFT"]);
        assert!(matches!(store.remove("AAPL"), Err(AppError::NotFound)));
    }
}
