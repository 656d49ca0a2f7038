use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::db::{RemoteBackend, RemoteTable};
use crate::models::NotificationCategory;
use crate::services::notification_service::NotificationCenter;
use crate::store::{LocalStore, PersistedCollection, Record};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// Another sync of this collection was in flight; nothing was done.
    AlreadyRunning,
    /// This user was already synced and the call was not forced.
    UpToDate,
    Completed { pushed: usize, pulled: usize },
    /// Remote error; local state was left as it was.
    Failed { reason: String },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    pub user_id: Uuid,
    pub positions: SyncOutcome,
    pub watchlist: SyncOutcome,
    pub alerts: SyncOutcome,
    pub finished_at: DateTime<Utc>,
}

impl SyncReport {
    pub fn failed(&self) -> bool {
        [&self.positions, &self.watchlist, &self.alerts]
            .iter()
            .any(|o| matches!(o, SyncOutcome::Failed { .. }))
    }

    fn pulled(&self) -> usize {
        [&self.positions, &self.watchlist, &self.alerts]
            .iter()
            .map(|o| match o {
                SyncOutcome::Completed { pulled, .. } => *pulled,
                _ => 0,
            })
            .sum()
    }
}

/// Per-collection sync bookkeeping: the in-flight flag and who was synced last.
#[derive(Default)]
struct SyncState {
    running: AtomicBool,
    last_user: Mutex<Option<Uuid>>,
}

/// Clears the in-flight flag however the sync ends.
struct RunningGuard<'a>(&'a AtomicBool);

impl<'a> RunningGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunningGuard(flag))
    }
}

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Best-effort two-way sync between the local store and the hosted backend.
pub struct SyncService {
    store: Arc<LocalStore>,
    backend: RemoteBackend,
    notifications: Arc<NotificationCenter>,
    positions: SyncState,
    watchlist: SyncState,
    alerts: SyncState,
    last_report: RwLock<Option<SyncReport>>,
}

impl SyncService {
    pub fn new(store: Arc<LocalStore>, backend: RemoteBackend, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            store,
            backend,
            notifications,
            positions: SyncState::default(),
            watchlist: SyncState::default(),
            alerts: SyncState::default(),
            last_report: RwLock::new(None),
        }
    }

    pub fn last_report(&self) -> Option<SyncReport> {
        self.last_report.read().clone()
    }

    /// Forget who was synced last, so the next login syncs again.
    pub fn reset(&self) {
        for state in [&self.positions, &self.watchlist, &self.alerts] {
            *state.last_user.lock() = None;
        }
    }

    /// Drop everything the signed-out user left locally so the next user starts empty.
    pub fn sign_out(&self) {
        self.reset();
        self.store.clear();
        self.store.set_owner(None);
    }

    /// Push local-only records, then pull the remote copy of every collection.
    ///
    /// Collections sync independently and concurrently. Nothing here returns an error;
    /// failures are reported per collection in the outcome. Local data owned by another
    /// user is discarded first and never pushed.
    pub async fn sync_with_remote(&self, user_id: Uuid, force: bool) -> SyncReport {
        info!("🔄 Syncing user {} with remote (force: {})", user_id, force);

        match self.store.owner() {
            Some(owner) if owner != user_id => {
                warn!("Local data belongs to {}, discarding it before syncing {}", owner, user_id);
                self.reset();
                self.store.clear();
                self.store.set_owner(Some(user_id));
            }
            Some(_) => {}
            None => self.store.set_owner(Some(user_id)),
        }

        let (positions, watchlist, alerts) = tokio::join!(
            sync_collection(
                &self.positions,
                self.store.portfolio.collection(),
                self.backend.positions.as_ref(),
                user_id,
                force,
                |remote| self.store.portfolio.replace_from_remote(remote),
            ),
            sync_collection(
                &self.watchlist,
                self.store.watchlist.collection(),
                self.backend.watchlist.as_ref(),
                user_id,
                force,
                |remote| self.store.watchlist.replace_from_remote(remote),
            ),
            sync_collection(
                &self.alerts,
                self.store.alerts.collection(),
                self.backend.alerts.as_ref(),
                user_id,
                force,
                |remote| self.store.alerts.replace_from_remote(remote),
            ),
        );

        let report = SyncReport {
            user_id,
            positions,
            watchlist,
            alerts,
            finished_at: Utc::now(),
        };

        if report.failed() {
            warn!("Sync for {} finished with errors: {:?}", user_id, report);
        } else if report.pulled() > 0 {
            self.notifications.notify(
                NotificationCategory::Sync,
                "Synced",
                format!("{} record(s) loaded from your account", report.pulled()),
                None,
            );
        }

        *self.last_report.write() = Some(report.clone());
        report
    }
}

async fn sync_collection<T, F>(
    state: &SyncState,
    collection: &PersistedCollection<T>,
    table: &dyn RemoteTable<T>,
    user_id: Uuid,
    force: bool,
    replace: F,
) -> SyncOutcome
where
    T: Record,
    F: FnOnce(Vec<T>),
{
    let name = collection.name();
    let Some(_guard) = RunningGuard::acquire(&state.running) else {
        debug!("Sync of {} already running, skipping", name);
        return SyncOutcome::AlreadyRunning;
    };

    if !force && *state.last_user.lock() == Some(user_id) {
        debug!("{} already synced for {}", name, user_id);
        return SyncOutcome::UpToDate;
    }

    let remote = match table.select_all(user_id).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to read remote {}: {}", name, e);
            return SyncOutcome::Failed { reason: e.to_string() };
        }
    };

    let remote_keys: Vec<T::Key> = remote.iter().map(|item| item.key()).collect();
    let local_only: Vec<T> = collection
        .snapshot()
        .into_iter()
        .filter(|item| !remote_keys.contains(&item.key()))
        .collect();

    for item in &local_only {
        if let Err(e) = table.insert(user_id, item).await {
            error!("Failed to push {} {}: {}", name, item.key(), e);
            return SyncOutcome::Failed { reason: e.to_string() };
        }
    }
    if !local_only.is_empty() {
        info!("⬆️ Pushed {} local {} to remote", local_only.len(), name);
    }

    let pulled = match table.select_all(user_id).await {
        Ok(rows) => rows,
        Err(e) => {
            error!("Failed to pull remote {}: {}", name, e);
            return SyncOutcome::Failed { reason: e.to_string() };
        }
    };

    let count = pulled.len();
    // An empty remote never wipes local data.
    if count > 0 {
        replace(pulled);
        info!("⬇️ Pulled {} {} from remote", count, name);
    }

    *state.last_user.lock() = Some(user_id);
    SyncOutcome::Completed {
        pushed: local_only.len(),
        pulled: count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryTable;
    use crate::models::{CreatePosition, Position, PriceAlert, WatchlistEntry};
    use crate::store::MemoryStorage;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn store() -> Arc<LocalStore> {
        Arc::new(LocalStore::new(Arc::new(MemoryStorage::new())))
    }

    fn create(symbol: &str) -> CreatePosition {
        CreatePosition {
            symbol: symbol.into(),
            units: 10.0,
            avg_cost: 100.0,
            current_price: None,
        }
    }

    struct Tables {
        positions: Arc<MemoryTable<Position>>,
        watchlist: Arc<MemoryTable<WatchlistEntry>>,
        alerts: Arc<MemoryTable<PriceAlert>>,
    }

    fn backend() -> (RemoteBackend, Tables) {
        let tables = Tables {
            positions: Arc::new(MemoryTable::new()),
            watchlist: Arc::new(MemoryTable::new()),
            alerts: Arc::new(MemoryTable::new()),
        };
        let backend = RemoteBackend {
            positions: tables.positions.clone(),
            watchlist: tables.watchlist.clone(),
            alerts: tables.alerts.clone(),
        };
        (backend, tables)
    }

    #[tokio::test]
    async fn test_pushes_local_then_pulls_remote() {
        let store = store();
        let (backend, tables) = backend();
        let user = Uuid::new_v4();

        let remote = Position::new("MSFT", 2.0, 300.0, 0.0).unwrap();
        tables.positions.insert(user, &remote).await.unwrap();
        store.portfolio.add(&create("AAPL")).unwrap();

        let sync = SyncService::new(store.clone(), backend, Arc::new(NotificationCenter::default()));
        let report = sync.sync_with_remote(user, false).await;

        assert_eq!(report.positions, SyncOutcome::Completed { pushed: 1, pulled: 2 });
        assert_eq!(tables.positions.rows(user).len(), 2);
        assert_eq!(store.portfolio.positions().len(), 2);
    }

    #[tokio::test]
    async fn test_empty_remote_keeps_local_and_second_call_is_up_to_date() {
        let store = store();
        let (backend, _) = backend();
        let user = Uuid::new_v4();
        store.watchlist.add("AAPL").unwrap();

        let sync = SyncService::new(store.clone(), backend, Arc::new(NotificationCenter::default()));
        sync.sync_with_remote(user, false).await;
        let second = sync.sync_with_remote(user, false).await;

        assert_eq!(second.watchlist, SyncOutcome::UpToDate);
        assert_eq!(store.watchlist.symbols(), vec!["AAPL".to_string()]);

        let forced = sync.sync_with_remote(user, true).await;
        assert!(matches!(forced.watchlist, SyncOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_remote_failure_leaves_local_untouched() {
        let store = store();
        let (backend, tables) = backend();
        let user = Uuid::new_v4();
        store.portfolio.add(&create("AAPL")).unwrap();
        tables.positions.set_failing(true);

        let sync = SyncService::new(store.clone(), backend, Arc::new(NotificationCenter::default()));
        let report = sync.sync_with_remote(user, false).await;

        assert!(matches!(report.positions, SyncOutcome::Failed { .. }));
        assert!(report.failed());
        assert_eq!(store.portfolio.positions().len(), 1);

        // A failed sync does not mark the user as synced.
        tables.positions.set_failing(false);
        let retry = sync.sync_with_remote(user, false).await;
        assert!(matches!(retry.positions, SyncOutcome::Completed { .. }));
    }

    #[tokio::test]
    async fn test_local_data_of_another_user_is_not_pushed() {
        let store = store();
        let (backend, tables) = backend();
        let alice = Uuid::new_v4();
        let bob = Uuid::new_v4();
        store.portfolio.add(&create("AAPL")).unwrap();
        store.set_owner(Some(alice));

        let sync = SyncService::new(store.clone(), backend, Arc::new(NotificationCenter::default()));
        let report = sync.sync_with_remote(bob, false).await;

        assert_eq!(report.positions, SyncOutcome::Completed { pushed: 0, pulled: 0 });
        assert!(tables.positions.rows(bob).is_empty());
        assert!(store.portfolio.positions().is_empty());
        assert_eq!(store.owner(), Some(bob));
    }

    #[tokio::test]
    async fn test_first_sync_claims_unowned_local_data() {
        let store = store();
        let (backend, tables) = backend();
        let user = Uuid::new_v4();
        store.watchlist.add("AAPL").unwrap();

        let sync = SyncService::new(store.clone(), backend, Arc::new(NotificationCenter::default()));
        sync.sync_with_remote(user, false).await;

        assert_eq!(store.owner(), Some(user));
        assert_eq!(tables.watchlist.rows(user).len(), 1);

        sync.sign_out();
        assert!(store.owner().is_none());
        assert!(store.watchlist.symbols().is_empty());
        assert_eq!(tables.watchlist.rows(user).len(), 1);
    }

    /// Blocks `select_all` until released so two syncs overlap.
    struct Gate {
        inner: MemoryTable<WatchlistEntry>,
        entered: Notify,
        release: Notify,
    }

    #[async_trait]
    impl RemoteTable<WatchlistEntry> for Gate {
        async fn select_all(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, crate::errors::AppError> {
            if self.inner.select_count() == 0 {
                self.entered.notify_one();
                self.release.notified().await;
            }
            self.inner.select_all(user_id).await
        }

        async fn insert(&self, user_id: Uuid, item: &WatchlistEntry) -> Result<(), crate::errors::AppError> {
            self.inner.insert(user_id, item).await
        }

        async fn upsert(&self, user_id: Uuid, item: &WatchlistEntry) -> Result<(), crate::errors::AppError> {
            self.inner.upsert(user_id, item).await
        }

        async fn delete(&self, user_id: Uuid, key: &String) -> Result<(), crate::errors::AppError> {
            self.inner.delete(user_id, key).await
        }
    }

    #[tokio::test]
    async fn test_concurrent_sync_runs_once() {
        let store = store();
        let (mut backend, _) = backend();
        let gate = Arc::new(Gate {
            inner: MemoryTable::new(),
            entered: Notify::new(),
            release: Notify::new(),
        });
        backend.watchlist = gate.clone();
        let sync = Arc::new(SyncService::new(store, backend, Arc::new(NotificationCenter::default())));
        let user = Uuid::new_v4();

        let first = tokio::spawn({
            let sync = sync.clone();
            async move { sync.sync_with_remote(user, true).await }
        });
        gate.entered.notified().await;

        let second = sync.sync_with_remote(user, true).await;
        assert_eq!(second.watchlist, SyncOutcome::AlreadyRunning);

        gate.release.notify_one();
        let first = first.await.unwrap();
        assert!(matches!(first.watchlist, SyncOutcome::Completed { .. }));
        // One gated read plus the pull that follows it.
        assert_eq!(gate.inner.select_count(), 2);
    }
}
