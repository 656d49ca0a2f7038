pub mod alert_store;
pub mod collection;
pub mod mutation;
pub mod portfolio_store;
pub mod storage;
pub mod watchlist_store;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

pub use alert_store::AlertStore;
pub use collection::{PersistedCollection, Record};
pub use mutation::{commit_or_rollback, Mutation};
pub use portfolio_store::PortfolioStore;
pub use storage::{JsonFileStorage, LocalStorage, MemoryStorage};
pub use watchlist_store::WatchlistStore;

use crate::errors::AppError;

const OWNER_KEY: &str = "owner";

/// The last persistence failure, kept for the UI to surface once.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreStatus {
    pub last_error: Option<String>,
    pub last_error_at: Option<DateTime<Utc>>,
}

/// Everything the user owns locally: positions, watchlist, alerts.
pub struct LocalStore {
    pub portfolio: PortfolioStore,
    pub watchlist: WatchlistStore,
    pub alerts: AlertStore,
    storage: Arc<dyn LocalStorage>,
    /// The user whose remote data the collections were last synced with.
    owner: RwLock<Option<Uuid>>,
    status: RwLock<StoreStatus>,
}

impl LocalStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            portfolio: PortfolioStore::new(storage.clone()),
            watchlist: WatchlistStore::new(storage.clone()),
            alerts: AlertStore::new(storage.clone()),
            storage,
            owner: RwLock::new(None),
            status: RwLock::new(StoreStatus::default()),
        }
    }

    /// Restore every collection from local storage. A collection that fails to load
    /// starts empty; the others still load.
    pub fn hydrate(&self) {
        let results = [
            ("positions", self.portfolio.hydrate()),
            ("watchlist", self.watchlist.hydrate()),
            ("alerts", self.alerts.hydrate()),
        ];
        for (name, result) in results {
            match result {
                Ok(count) => info!("💾 Restored {} {} from local storage", count, name),
                Err(e) => warn!("Could not restore {} from local storage, starting empty: {}", name, e),
            }
        }
        match self.load_owner() {
            Ok(owner) => *self.owner.write() = owner,
            Err(e) => warn!("Could not restore data owner from local storage: {}", e),
        }
    }

    fn load_owner(&self) -> Result<Option<Uuid>, AppError> {
        match self.storage.load(OWNER_KEY)? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(None),
        }
    }

    pub fn owner(&self) -> Option<Uuid> {
        *self.owner.read()
    }

    /// Record which user the local data belongs to. `None` marks it as nobody's.
    pub fn set_owner(&self, owner: Option<Uuid>) {
        let mut current = self.owner.write();
        *current = owner;
        let result = serde_json::to_string(&owner)
            .map_err(AppError::from)
            .and_then(|raw| self.storage.save(OWNER_KEY, &raw));
        if let Err(e) = result {
            warn!("Failed to persist data owner: {}", e);
            self.set_error(format!("could not save local data: {}", e));
        }
    }

    /// Drop every local record. Nothing is sent to the remote.
    pub fn clear(&self) {
        self.portfolio.collection().replace_all(Vec::new());
        self.watchlist.collection().replace_all(Vec::new());
        self.alerts.collection().replace_all(Vec::new());
        info!("🧹 Cleared local data");
    }

    /// Every symbol the dashboard needs prices for.
    pub fn tracked_symbols(&self) -> Vec<String> {
        let mut symbols = self.portfolio.symbols();
        for symbol in self.watchlist.symbols().into_iter().chain(self.alerts.active_symbols()) {
            if !symbols.contains(&symbol) {
                symbols.push(symbol);
            }
        }
        symbols
    }

    pub fn status(&self) -> StoreStatus {
        self.status.read().clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        let mut status = self.status.write();
        status.last_error = Some(message.into());
        status.last_error_at = Some(Utc::now());
    }

    /// Returns the pending error, clearing it.
    pub fn take_error(&self) -> Option<String> {
        let mut status = self.status.write();
        status.last_error_at = None;
        status.last_error.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlertCondition, CreateAlertRequest, CreatePosition};

    #[test]
    fn test_hydrate_survives_restart() {
        let dir = tempfile::tempdir().unwrap();

        {
            let storage = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
            let store = LocalStore::new(storage);
            store
                .portfolio
                .add(&CreatePosition {
                    symbol: "AAPL".into(),
                    units: 10.0,
                    avg_cost: 100.0,
                    current_price: Some(110.0),
                })
                .unwrap();
            store.watchlist.add("MSFT").unwrap();
            store
                .alerts
                .add(&CreateAlertRequest {
                    symbol: "TSLA".into(),
                    target_price: 300.0,
                    condition: AlertCondition::Above,
                })
                .unwrap();
        }

        let storage = Arc::new(JsonFileStorage::open(dir.path()).unwrap());
        let store = LocalStore::new(storage);
        store.hydrate();

        let positions = store.portfolio.positions();
        assert_eq!(positions.len(), 1);
        assert_eq!(positions[0].profit_loss(), 100.0);
        assert_eq!(store.watchlist.symbols(), vec!["MSFT"]);
        assert_eq!(store.tracked_symbols(), vec!["AAPL", "MSFT", "TSLA"]);
    }

    #[test]
    fn test_owner_survives_restart_and_clear_empties_collections() {
        let dir = tempfile::tempdir().unwrap();
        let user = Uuid::new_v4();

        {
            let store = LocalStore::new(Arc::new(JsonFileStorage::open(dir.path()).unwrap()));
            store.watchlist.add("MSFT").unwrap();
            store.set_owner(Some(user));
        }

        let store = LocalStore::new(Arc::new(JsonFileStorage::open(dir.path()).unwrap()));
        store.hydrate();
        assert_eq!(store.owner(), Some(user));

        store.clear();
        store.set_owner(None);
        assert!(store.tracked_symbols().is_empty());

        let reopened = LocalStore::new(Arc::new(JsonFileStorage::open(dir.path()).unwrap()));
        reopened.hydrate();
        assert!(reopened.owner().is_none());
        assert!(reopened.watchlist.symbols().is_empty());
    }

    #[test]
    fn test_error_flag_is_taken_once() {
        let store = LocalStore::new(Arc::new(MemoryStorage::new()));
        store.set_error("remote insert failed");

        assert!(store.status().last_error.is_some());
        assert_eq!(store.take_error().as_deref(), Some("remote insert failed"));
        assert!(store.take_error().is_none());
    }
}
