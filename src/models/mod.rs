pub mod alert;
pub mod allocation;
pub mod news;
pub mod notification;
pub mod position;
pub mod quote;
pub mod recommendation;
pub mod watchlist;

pub use alert::{AlertCondition, CreateAlertRequest, PriceAlert, UpdateAlertRequest};
pub use allocation::{AllocationBreach, AllocationLimits, AllocationReport, SymbolWeight};
pub use news::{NewsItem, NewsQueryParams, Sentiment, SentimentSnapshot, SocialSentiment};
pub use notification::{Notification, NotificationCategory};
pub use position::{CreatePosition, PortfolioSummary, Position, UpdatePosition};
pub use quote::Quote;
pub use recommendation::{Fundamentals, Recommendation, RecommendationLabel, TechnicalSignals};
pub use watchlist::{AddWatchlistEntryRequest, WatchlistEntry, WatchlistEntryResponse};
