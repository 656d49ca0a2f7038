pub mod alert_service;
pub mod allocation_service;
pub mod dashboard_service;
pub mod job_scheduler_service;
pub mod news_service;
pub mod notification_service;
pub mod polling_service;
pub mod position_service;
pub mod quote_cache;
pub mod quote_service;
pub mod recommendation_service;
pub mod remote_writer;
pub mod session_service;
pub mod social_sentiment_service;
pub mod sync_service;
pub mod watchlist_service;
