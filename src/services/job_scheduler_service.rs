use std::sync::Arc;

use chrono::Utc;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::AppError;
use crate::jobs::remote_sync_job;
use crate::services::quote_service::QuoteService;
use crate::services::session_service::SessionService;

pub const DEFAULT_SYNC_CRON: &str = "0 */5 * * * *";
const CACHE_CLEANUP_CRON: &str = "30 * * * * *";

// Context passed to job functions
#[derive(Clone)]
pub struct JobContext {
    pub session: Arc<SessionService>,
    pub quotes: Arc<QuoteService>,
}

#[derive(Debug, Default)]
pub struct JobResult {
    pub items_processed: usize,
    pub items_failed: usize,
}

pub struct JobSchedulerService {
    scheduler: JobScheduler,
    context: JobContext,
    sync_cron: String,
}

impl JobSchedulerService {
    pub async fn new(context: JobContext, sync_cron: impl Into<String>) -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::External(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self {
            scheduler,
            context,
            sync_cron: sync_cron.into(),
        })
    }

    /// Register every job and start ticking.
    pub async fn start(&mut self) -> Result<(), AppError> {
        info!("🚀 Starting job scheduler...");

        // Format: sec min hour day month weekday
        let sync_cron = self.sync_cron.clone();
        self.schedule_job(
            &sync_cron,
            "sync_remote",
            "Periodic remote sync",
            remote_sync_job::sync_logged_in_user,
        )
        .await?;

        self.schedule_job(
            CACHE_CLEANUP_CRON,
            "cleanup_quote_cache",
            "Every minute at :30",
            cleanup_expired_quotes,
        )
        .await?;

        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::External(format!("Failed to start scheduler: {}", e)))?;

        info!("✅ Job scheduler started");
        Ok(())
    }

    pub async fn stop(&mut self) -> Result<(), AppError> {
        info!("🛑 Stopping job scheduler...");
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::External(format!("Failed to stop scheduler: {}", e)))?;
        info!("✅ Job scheduler stopped");
        Ok(())
    }

    async fn schedule_job<F, Fut>(
        &mut self,
        schedule: &str,
        job_name: &'static str,
        description: &str,
        job_fn: F,
    ) -> Result<(), AppError>
    where
        F: Fn(JobContext) -> Fut + Send + Sync + 'static,
        Fut: std::future::Future<Output = Result<JobResult, AppError>> + Send + 'static,
    {
        let context = self.context.clone();
        let job_fn = Arc::new(job_fn);

        let job = Job::new_async(schedule, move |_uuid, _l| {
            let context = context.clone();
            let job_fn = job_fn.clone();
            Box::pin(async move {
                execute_job(job_name, context, job_fn).await;
            })
        })
        .map_err(|e| AppError::External(format!("Failed to create job {}: {}", job_name, e)))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| AppError::External(format!("Failed to add job {}: {}", job_name, e)))?;

        info!("📅 Scheduled: {} - {} [cron: {}]", job_name, description, schedule);
        Ok(())
    }
}

async fn execute_job<F, Fut>(job_name: &str, context: JobContext, job_fn: Arc<F>)
where
    F: Fn(JobContext) -> Fut,
    Fut: std::future::Future<Output = Result<JobResult, AppError>>,
{
    info!("🏃 Starting job: {}", job_name);
    let started_at = Utc::now();

    let result = job_fn(context).await;
    let duration_ms = (Utc::now() - started_at).num_milliseconds();

    match result {
        Ok(job_result) => info!(
            "✅ Job completed: {} (processed: {}, failed: {}, duration: {}ms)",
            job_name, job_result.items_processed, job_result.items_failed, duration_ms
        ),
        Err(e) => error!("❌ Job failed: {} - {} ({}ms)", job_name, e, duration_ms),
    }
}

pub async fn cleanup_expired_quotes(ctx: JobContext) -> Result<JobResult, AppError> {
    let removed = ctx.quotes.cache().cleanup_expired();
    if removed > 0 {
        info!("🗑️ Dropped {} stale quote batch(es)", removed);
    }
    Ok(JobResult {
        items_processed: removed,
        items_failed: 0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::external::quote_provider::{QuoteProvider, QuoteProviderError};
    use crate::models::Quote;
    use crate::services::quote_cache::QuoteCache;
    use async_trait::async_trait;
    use std::collections::HashMap;

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

    #[tokio::test]
    async fn test_cleanup_job_drops_stale_batches() {
        let cache = QuoteCache::new(chrono::Duration::seconds(30));
        cache.insert_at("OLD".into(), HashMap::new(), Utc::now() - chrono::Duration::minutes(5));
        let ctx = JobContext {
            session: Arc::new(SessionService::local_only()),
            quotes: Arc::new(QuoteService::new(Arc::new(Nothing), cache)),
        };

        let result = cleanup_expired_quotes(ctx.clone()).await.unwrap();

        assert_eq!(result.items_processed, 1);
        assert!(ctx.quotes.cache().is_empty());
    }
}
