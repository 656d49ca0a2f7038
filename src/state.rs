use std::sync::Arc;

use crate::db::RemoteBackend;
use crate::models::AllocationLimits;
use crate::services::dashboard_service::DashboardService;
use crate::services::news_service::NewsService;
use crate::services::notification_service::NotificationCenter;
use crate::services::quote_service::QuoteService;
use crate::services::recommendation_service::RecommendationService;
use crate::services::remote_writer::RemoteWriter;
use crate::services::session_service::SessionService;
use crate::services::social_sentiment_service::SocialSentimentService;
use crate::services::sync_service::SyncService;
use crate::store::LocalStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<LocalStore>,
    pub notifications: Arc<NotificationCenter>,
    pub session: Arc<SessionService>,
    pub writer: Arc<RemoteWriter>,
    pub quotes: Arc<QuoteService>,
    pub news: Arc<NewsService>,
    pub recommendations: Arc<RecommendationService>,
    pub dashboard: Arc<DashboardService>,
    pub allocation: AllocationLimits,
}

impl AppState {
    /// Wire the services together. `backend` is `None` in local-only mode.
    pub fn new(
        store: Arc<LocalStore>,
        backend: Option<RemoteBackend>,
        quotes: Arc<QuoteService>,
        news: Arc<NewsService>,
        social: Arc<SocialSentimentService>,
        allocation: AllocationLimits,
    ) -> Self {
        let notifications = Arc::new(NotificationCenter::default());

        let sync = backend
            .clone()
            .map(|backend| Arc::new(SyncService::new(store.clone(), backend, notifications.clone())));
        let session = Arc::new(SessionService::new(backend, sync));
        let writer = Arc::new(RemoteWriter::new(store.clone(), session.clone(), notifications.clone()));

        let recommendations = Arc::new(RecommendationService::new(quotes.clone(), news.clone(), social.clone()));
        let dashboard = Arc::new(DashboardService::new(
            quotes.clone(),
            writer.clone(),
            recommendations.clone(),
            news.clone(),
            social,
        ));

        Self {
            store,
            notifications,
            session,
            writer,
            quotes,
            news,
            recommendations,
            dashboard,
            allocation,
        }
    }
}
