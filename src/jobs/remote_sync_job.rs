use tracing::{debug, warn};

use crate::errors::AppError;
use crate::services::job_scheduler_service::{JobContext, JobResult};

/// Re-sync the logged-in user so edits made elsewhere show up here.
///
/// Does nothing in local-only mode or when nobody is logged in.
pub async fn sync_logged_in_user(ctx: JobContext) -> Result<JobResult, AppError> {
    if ctx.session.current_user().is_none() {
        debug!("No user logged in, skipping remote sync");
        return Ok(JobResult::default());
    }

    let report = match ctx.session.sync_now(true).await {
        Ok(report) => report,
        Err(AppError::Validation(reason)) => {
            debug!("Remote sync skipped: {}", reason);
            return Ok(JobResult::default());
        }
        Err(e) => return Err(e),
    };

    let outcomes = [&report.positions, &report.watchlist, &report.alerts];
    let failed = outcomes
        .iter()
        .filter(|o| matches!(o, crate::services::sync_service::SyncOutcome::Failed { .. }))
        .count();
    if failed > 0 {
        warn!("Periodic sync for {} had {} failed collection(s)", report.user_id, failed);
    }

    Ok(JobResult {
        items_processed: outcomes.len() - failed,
        items_failed: failed,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::RemoteBackend;
    use crate::external::quote_provider::{QuoteProvider, QuoteProviderError};
    use crate::models::Quote;
    use crate::services::notification_service::NotificationCenter;
    use crate::services::quote_cache::QuoteCache;
    use crate::services::quote_service::QuoteService;
    use crate::services::session_service::SessionService;
    use crate::services::sync_service::SyncService;
    use crate::store::{LocalStore, MemoryStorage};
    use async_trait::async_trait;
    use std::sync::Arc;
    use uuid::Uuid;

    struct Nothing;

    #[async_trait]
    impl QuoteProvider for Nothing {
        fn name(&self) -> &'static str {
            "nothing"
        }

        async fn fetch_quotes(&self, _symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError> {
            Ok(Vec::new())
        }
    }

    fn quotes() -> Arc<QuoteService> {
        Arc::new(QuoteService::new(Arc::new(Nothing), QuoteCache::new(chrono::Duration::seconds(30))))
    }

    #[tokio::test]
    async fn test_skips_when_logged_out() {
        let ctx = JobContext {
            session: Arc::new(SessionService::local_only()),
            quotes: quotes(),
        };
        let result = sync_logged_in_user(ctx).await.unwrap();
        assert_eq!(result.items_processed, 0);
    }

    #[tokio::test]
    async fn test_forces_sync_for_logged_in_user() {
        let backend = RemoteBackend::in_memory();
        let store = Arc::new(LocalStore::new(Arc::new(MemoryStorage::new())));
        let sync = Arc::new(SyncService::new(store, backend.clone(), Arc::new(NotificationCenter::default())));
        let session = Arc::new(SessionService::new(Some(backend), Some(sync)));
        session.login(Uuid::new_v4()).await;

        let ctx = JobContext { session, quotes: quotes() };
        let result = sync_logged_in_user(ctx).await.unwrap();

        assert_eq!(result.items_processed, 3);
        assert_eq!(result.items_failed, 0);
    }
}
