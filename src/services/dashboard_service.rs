use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use futures::FutureExt;
use parking_lot::RwLock;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::{Quote, Recommendation, SentimentSnapshot};
use crate::services::alert_service;
use crate::services::news_service::{NewsService, DEFAULT_NEWS_LIMIT};
use crate::services::polling_service::{
    MountOutcome, PollTask, PollingScheduler, ALERTS_INTERVAL, MARKET_INTERVAL, PORTFOLIO_INTERVAL,
    RECOMMENDATIONS_INTERVAL, SENTIMENT_INTERVAL,
};
use crate::services::quote_service::QuoteService;
use crate::services::recommendation_service::RecommendationService;
use crate::services::remote_writer::RemoteWriter;
use crate::services::social_sentiment_service::SocialSentimentService;

// ==============================================================================
// Views
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum View {
    Portfolio,
    Alerts,
    Market,
    Recommendations,
    Sentiment,
}

impl View {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "portfolio" => Some(View::Portfolio),
            "alerts" => Some(View::Alerts),
            "market" => Some(View::Market),
            "recommendations" => Some(View::Recommendations),
            "sentiment" => Some(View::Sentiment),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Portfolio => "portfolio",
            View::Alerts => "alerts",
            View::Market => "market",
            View::Recommendations => "recommendations",
            View::Sentiment => "sentiment",
        }
    }

    pub fn interval(&self) -> Duration {
        match self {
            View::Portfolio => PORTFOLIO_INTERVAL,
            View::Alerts => ALERTS_INTERVAL,
            View::Market => MARKET_INTERVAL,
            View::Recommendations => RECOMMENDATIONS_INTERVAL,
            View::Sentiment => SENTIMENT_INTERVAL,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketRegion {
    Us,
    Eu,
    Asia,
}

impl MarketRegion {
    pub fn from_key(key: &str) -> Option<Self> {
        match key.to_lowercase().as_str() {
            "us" => Some(MarketRegion::Us),
            "eu" => Some(MarketRegion::Eu),
            "asia" => Some(MarketRegion::Asia),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MarketRegion::Us => "us",
            MarketRegion::Eu => "eu",
            MarketRegion::Asia => "asia",
        }
    }

    pub fn indices(&self) -> &'static [&'static str] {
        match self {
            MarketRegion::Us => &["^GSPC", "^DJI", "^IXIC"],
            MarketRegion::Eu => &["^STOXX50E", "^GDAXI", "^FTSE"],
            MarketRegion::Asia => &["^N225", "^HSI"],
        }
    }
}

// ==============================================================================
// Boards
// ==============================================================================

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketBoard {
    pub region: MarketRegion,
    pub indices: Vec<Quote>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceRefresh {
    pub symbols: usize,
    pub available: usize,
    pub positions_updated: usize,
    pub alerts_fired: usize,
}

/// The latest results of every refresh cycle. Later completions overwrite earlier ones.
#[derive(Default)]
struct Boards {
    quotes: HashMap<String, Quote>,
    market: Option<MarketBoard>,
    recommendations: Vec<Recommendation>,
    sentiment: HashMap<String, SentimentSnapshot>,
}

/// The refresh cycles behind each dashboard view and the pollers that drive them.
pub struct DashboardService {
    quotes: Arc<QuoteService>,
    writer: Arc<RemoteWriter>,
    recommendations: Arc<RecommendationService>,
    news: Arc<NewsService>,
    social: Arc<SocialSentimentService>,
    scheduler: PollingScheduler,
    boards: RwLock<Boards>,
}

impl DashboardService {
    pub fn new(
        quotes: Arc<QuoteService>,
        writer: Arc<RemoteWriter>,
        recommendations: Arc<RecommendationService>,
        news: Arc<NewsService>,
        social: Arc<SocialSentimentService>,
    ) -> Self {
        Self {
            quotes,
            writer,
            recommendations,
            news,
            social,
            scheduler: PollingScheduler::new(),
            boards: RwLock::new(Boards::default()),
        }
    }

    pub fn latest_quotes(&self) -> HashMap<String, Quote> {
        self.boards.read().quotes.clone()
    }

    pub fn market_board(&self) -> Option<MarketBoard> {
        self.boards.read().market.clone()
    }

    pub fn recommendation_board(&self) -> Vec<Recommendation> {
        self.boards.read().recommendations.clone()
    }

    pub fn sentiment_board(&self) -> Vec<SentimentSnapshot> {
        let mut board: Vec<SentimentSnapshot> = self.boards.read().sentiment.values().cloned().collect();
        board.sort_by(|a, b| a.symbol.cmp(&b.symbol));
        board
    }

    pub fn mounted_views(&self) -> Vec<String> {
        self.scheduler.mounted_views()
    }

    // --------------------------------------------------------------------------
    // Refresh cycles
    // --------------------------------------------------------------------------

    /// Fetch every tracked symbol, apply prices to positions and check alerts.
    pub async fn refresh_prices(&self) -> Result<PriceRefresh, AppError> {
        let symbols = self.writer.store().tracked_symbols();
        self.apply_quotes(&symbols).await
    }

    /// Same as [`Self::refresh_prices`] but only for symbols with armed alerts.
    pub async fn refresh_alerts(&self) -> Result<PriceRefresh, AppError> {
        let symbols = self.writer.store().alerts.active_symbols();
        self.apply_quotes(&symbols).await
    }

    async fn apply_quotes(&self, symbols: &[String]) -> Result<PriceRefresh, AppError> {
        if symbols.is_empty() {
            return Ok(PriceRefresh::default());
        }

        let quotes = self.quotes.fetch_quotes(symbols).await?;
        let portfolio = &self.writer.store().portfolio;

        let mut refresh = PriceRefresh {
            symbols: quotes.len(),
            ..PriceRefresh::default()
        };
        for quote in quotes.values().filter(|q| q.is_available()) {
            refresh.available += 1;
            match portfolio.update_price(&quote.symbol, quote.price) {
                Ok(changed) => refresh.positions_updated += changed.len(),
                Err(e) => warn!("Could not apply price for {}: {}", quote.symbol, e),
            }
        }

        self.boards.write().quotes.extend(quotes.clone());
        refresh.alerts_fired = alert_service::check_quotes(&self.writer, &quotes).await.len();

        debug!(
            "Price refresh: {}/{} available, {} position(s) updated, {} alert(s) fired",
            refresh.available, refresh.symbols, refresh.positions_updated, refresh.alerts_fired
        );
        Ok(refresh)
    }

    pub async fn refresh_market(&self, region: MarketRegion) -> Result<MarketBoard, AppError> {
        let quotes = self.quotes.fetch_quotes(region.indices()).await?;
        let indices = region
            .indices()
            .iter()
            .filter_map(|symbol| quotes.get(*symbol).cloned())
            .collect();

        let board = MarketBoard {
            region,
            indices,
            updated_at: Utc::now(),
        };
        self.boards.write().market = Some(board.clone());
        Ok(board)
    }

    pub async fn refresh_recommendations(&self) -> Result<Vec<Recommendation>, AppError> {
        let symbols = self.writer.store().tracked_symbols();
        let recommendations = self.recommendations.recommend_all(&symbols).await?;
        self.boards.write().recommendations = recommendations.clone();
        Ok(recommendations)
    }

    pub async fn refresh_sentiment(&self) -> Vec<SentimentSnapshot> {
        let symbols = self.writer.store().tracked_symbols();
        let snapshots: Vec<SentimentSnapshot> = join_all(symbols.iter().map(|symbol| async move {
            let (news, social) = tokio::join!(
                self.news.fetch_news(symbol, DEFAULT_NEWS_LIMIT),
                self.social.fetch(symbol)
            );
            SentimentSnapshot::from_feeds(symbol, &news, social)
        }))
        .await;

        self.boards.write().sentiment = snapshots
            .iter()
            .map(|s| (s.symbol.clone(), s.clone()))
            .collect();
        snapshots
    }

    // --------------------------------------------------------------------------
    // View lifecycle
    // --------------------------------------------------------------------------

    /// Start polling for `view`. Only the market view takes a key (`us`, `eu`, `asia`).
    pub fn mount(self: &Arc<Self>, view: View, key: Option<String>) -> Result<MountOutcome, AppError> {
        let key = match view {
            View::Market => {
                let key = key.unwrap_or_else(|| MarketRegion::Us.as_str().to_string());
                let region = MarketRegion::from_key(&key)
                    .ok_or_else(|| AppError::Validation(format!("unknown market '{}'", key)))?;
                Some(region.as_str().to_string())
            }
            _ => None,
        };

        let task = self.view_task(view, key.as_deref());
        Ok(self.scheduler.mount(view.as_str(), key, view.interval(), task))
    }

    pub fn unmount(&self, view: View) -> bool {
        self.scheduler.unmount(view.as_str())
    }

    pub fn unmount_all(&self) {
        info!("Stopping all dashboard pollers");
        self.scheduler.unmount_all();
    }

    fn view_task(self: &Arc<Self>, view: View, key: Option<&str>) -> PollTask {
        let dashboard = Arc::clone(self);
        let region = key.and_then(MarketRegion::from_key).unwrap_or(MarketRegion::Us);

        Arc::new(move || {
            let dashboard = dashboard.clone();
            async move {
                let result = match view {
                    View::Portfolio => dashboard.refresh_prices().await.map(|_| ()),
                    View::Alerts => dashboard.refresh_alerts().await.map(|_| ()),
                    View::Market => dashboard.refresh_market(region).await.map(|_| ()),
                    View::Recommendations => dashboard.refresh_recommendations().await.map(|_| ()),
                    View::Sentiment => {
                        dashboard.refresh_sentiment().await;
                        Ok(())
                    }
                };
                // Failed cycles are retried on the next tick.
                if let Err(e) = result {
                    warn!("{} refresh failed: {}", view.as_str(), e);
                }
            }
            .boxed()
        })
    }
}
