use std::sync::Arc;

use tracing::warn;

use crate::db::{RemoteBackend, RemoteTable};
use crate::errors::AppError;
use crate::models::NotificationCategory;
use crate::services::notification_service::NotificationCenter;
use crate::services::session_service::SessionService;
use crate::store::{commit_or_rollback, LocalStore, Mutation, PersistedCollection, Record};

/// Picks the remote table for a collection out of the backend.
pub type TableSelector<T> = fn(&RemoteBackend) -> Arc<dyn RemoteTable<T>>;

/// Replays a local mutation on the remote table. Updates are a single upsert, so a
/// failed update never leaves the remote without the record.
pub async fn push_mutation<T: Record>(
    table: &dyn RemoteTable<T>,
    user_id: uuid::Uuid,
    mutation: &Mutation<T>,
) -> Result<(), AppError> {
    match mutation {
        Mutation::Insert(item) => table.insert(user_id, item).await,
        Mutation::Replace { next, .. } => table.upsert(user_id, next).await,
        Mutation::Delete { previous, .. } => table.delete(user_id, &previous.key()).await,
    }
}

/// Optimistic remote persistence for user edits.
///
/// The local mutation has already happened when `commit` is called. If the session
/// has no remote target the mutation stands as is.
pub struct RemoteWriter {
    store: Arc<LocalStore>,
    session: Arc<SessionService>,
    notifications: Arc<NotificationCenter>,
}

impl RemoteWriter {
    pub fn new(store: Arc<LocalStore>, session: Arc<SessionService>, notifications: Arc<NotificationCenter>) -> Self {
        Self {
            store,
            session,
            notifications,
        }
    }

    pub fn store(&self) -> &Arc<LocalStore> {
        &self.store
    }

    pub fn session(&self) -> &Arc<SessionService> {
        &self.session
    }

    pub fn notifications(&self) -> &Arc<NotificationCenter> {
        &self.notifications
    }

    /// Persist `mutation` remotely or roll it back, flag the store and raise a toast.
    pub async fn commit<T: Record>(
        &self,
        mutation: Mutation<T>,
        collection: &PersistedCollection<T>,
        select: TableSelector<T>,
    ) -> Result<Mutation<T>, AppError> {
        let Some(target) = self.session.remote() else {
            return Ok(mutation);
        };

        let table = select(&target.backend);
        let pending = mutation.clone();
        let result = commit_or_rollback(mutation, collection, || async move {
            push_mutation(table.as_ref(), target.user_id, &pending).await
        })
        .await;

        if let Err(e) = &result {
            self.store.set_error(e.to_string());
            self.notifications.notify(
                NotificationCategory::Error,
                "Changes not saved",
                format!("Your {} change could not be saved and was undone", collection.name()),
                None,
            );
        }
        result
    }

    /// Push already-applied changes without rollback; failures are only logged.
    pub async fn propagate<T: Record>(&self, changed: &[T], select: TableSelector<T>) {
        let Some(target) = self.session.remote() else {
            return;
        };
        let table = select(&target.backend);
        for item in changed {
            let replace = Mutation::Replace {
                previous: item.clone(),
                next: item.clone(),
            };
            if let Err(e) = push_mutation(table.as_ref(), target.user_id, &replace).await {
                warn!("Could not propagate {} to remote: {}", item.key(), e);
            }
        }
    }
}

pub fn positions_table(backend: &RemoteBackend) -> Arc<dyn RemoteTable<crate::models::Position>> {
    backend.positions.clone()
}

pub fn watchlist_table(backend: &RemoteBackend) -> Arc<dyn RemoteTable<crate::models::WatchlistEntry>> {
    backend.watchlist.clone()
}

pub fn alerts_table(backend: &RemoteBackend) -> Arc<dyn RemoteTable<crate::models::PriceAlert>> {
    backend.alerts.clone()
}
