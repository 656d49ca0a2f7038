use std::sync::Arc;

use parking_lot::RwLock;
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::db::RemoteBackend;
use crate::errors::AppError;
use crate::services::sync_service::{SyncReport, SyncService};
use crate::store::StoreStatus;

/// Where remote writes for the current session go.
#[derive(Clone)]
pub struct RemoteTarget {
    pub user_id: Uuid,
    pub backend: RemoteBackend,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    pub user_id: Option<Uuid>,
    pub remote_configured: bool,
    pub last_sync: Option<SyncReport>,
    pub store: StoreStatus,
}

/// The logged-in user, if any. Without a user or a backend the dashboard runs local-only.
pub struct SessionService {
    user: RwLock<Option<Uuid>>,
    backend: Option<RemoteBackend>,
    sync: Option<Arc<SyncService>>,
}

impl SessionService {
    pub fn new(backend: Option<RemoteBackend>, sync: Option<Arc<SyncService>>) -> Self {
        Self {
            user: RwLock::new(None),
            backend,
            sync,
        }
    }

    pub fn local_only() -> Self {
        Self::new(None, None)
    }

    pub fn current_user(&self) -> Option<Uuid> {
        *self.user.read()
    }

    pub fn remote(&self) -> Option<RemoteTarget> {
        let user_id = self.current_user()?;
        let backend = self.backend.clone()?;
        Some(RemoteTarget { user_id, backend })
    }

    /// Log `user_id` in and sync their data. Returns `None` in local-only mode.
    pub async fn login(&self, user_id: Uuid) -> Option<SyncReport> {
        let previous = self.user.write().replace(user_id);
        if previous != Some(user_id) {
            info!("👤 User {} logged in", user_id);
        }
        let sync = self.sync.as_ref()?;
        Some(sync.sync_with_remote(user_id, false).await)
    }

    /// Log out. With a backend the local copy of the user's data is dropped too; it
    /// lives on in their remote tables.
    pub fn logout(&self) {
        if let Some(user_id) = self.user.write().take() {
            info!("👤 User {} logged out", user_id);
        }
        if let Some(sync) = &self.sync {
            sync.sign_out();
        }
    }

    /// Sync the current user now.
    pub async fn sync_now(&self, force: bool) -> Result<SyncReport, AppError> {
        let user_id = self.current_user().ok_or(AppError::Unauthorized)?;
        let sync = self
            .sync
            .as_ref()
            .ok_or_else(|| AppError::Validation("no remote backend configured".into()))?;
        Ok(sync.sync_with_remote(user_id, force).await)
    }

    pub fn status(&self, store: StoreStatus) -> SessionStatus {
        SessionStatus {
            user_id: self.current_user(),
            remote_configured: self.backend.is_some(),
            last_sync: self.sync.as_ref().and_then(|s| s.last_report()),
            store,
        }
    }
}
