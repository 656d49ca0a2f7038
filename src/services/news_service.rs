use std::sync::Arc;
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, info, warn};

use crate::errors::AppError;
use crate::models::{NewsItem, Sentiment};
use crate::utils::normalize_symbol;

pub const DEFAULT_NEWS_LIMIT: usize = 10;
const MAX_NEWS_LIMIT: usize = 50;

/// Configuration for news service
#[derive(Debug, Clone)]
pub struct NewsConfig {
    pub enabled: bool,
    pub api_key: Option<String>,
    pub lookback_days: i64,
}

impl NewsConfig {
    pub fn from_env() -> Self {
        Self {
            enabled: std::env::var("NEWS_ENABLED")
                .ok()
                .and_then(|s| s.parse::<bool>().ok())
                .unwrap_or(true),
            api_key: std::env::var("FINNHUB_API_KEY").ok(),
            lookback_days: std::env::var("NEWS_LOOKBACK_DAYS")
                .ok()
                .and_then(|s| s.parse::<i64>().ok())
                .unwrap_or(7),
        }
    }
}

/// Trait for news providers
#[async_trait]
pub trait NewsProvider: Send + Sync {
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, AppError>;
}

/// Finnhub company-news endpoint
pub struct FinnhubProvider {
    api_key: String,
    client: Client,
    lookback_days: i64,
}

impl FinnhubProvider {
    pub fn new(api_key: String, lookback_days: i64, timeout: StdDuration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::External(format!("News client error: {}", e)))?;
        Ok(Self {
            api_key,
            client,
            lookback_days,
        })
    }
}

#[derive(Debug, Deserialize)]
struct FinnhubNewsItem {
    id: i64,
    headline: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    source: String,
    #[serde(default)]
    url: String,
    datetime: i64,
}

#[async_trait]
impl NewsProvider for FinnhubProvider {
    async fn fetch_news(&self, symbol: &str, limit: usize) -> Result<Vec<NewsItem>, AppError> {
        info!("Fetching news from Finnhub for {}", symbol);

        let to = Utc::now().date_naive();
        let from = to - Duration::days(self.lookback_days);

        let response = self
            .client
            .get("https://finnhub.io/api/v1/company-news")
            .query(&[
                ("symbol", symbol),
                ("from", &from.to_string()),
                ("to", &to.to_string()),
                ("token", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| {
                error!("Finnhub request failed: {}", e);
                AppError::External(format!("News API error: {}", e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            error!("Finnhub error {}: {}", status, error_text);
            return Err(AppError::External(format!(
                "News API returned error {}: {}",
                status, error_text
            )));
        }

        let items: Vec<FinnhubNewsItem> = response.json().await.map_err(|e| {
            error!("Failed to parse Finnhub response: {}", e);
            AppError::External(format!("Failed to parse news response: {}", e))
        })?;

        Ok(items
            .into_iter()
            .filter(|item| !item.headline.trim().is_empty())
            .take(limit)
            .map(|item| {
                let sentiment = classify_sentiment(&format!("{} {}", item.headline, item.summary));
                NewsItem {
                    id: item.id.to_string(),
                    headline: item.headline,
                    summary: item.summary,
                    source: item.source,
                    url: item.url,
                    timestamp: item.datetime,
                    sentiment,
                }
            })
            .collect())
    }
}

const POSITIVE_WORDS: &[&str] = &[
    "beat", "beats", "surge", "surges", "soar", "soars", "record", "upgrade", "upgraded",
    "growth", "profit", "rally", "rallies", "outperform", "raises", "strong", "gain", "gains",
];

const NEGATIVE_WORDS: &[&str] = &[
    "miss", "misses", "plunge", "plunges", "fall", "falls", "downgrade", "downgraded",
    "loss", "lawsuit", "probe", "recall", "cut", "cuts", "weak", "slump", "layoffs", "decline",
];

/// Keyword-count classification for providers that do not tag sentiment.
pub fn classify_sentiment(text: &str) -> Sentiment {
    let lower = text.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let positive = words.iter().filter(|w| POSITIVE_WORDS.contains(w)).count();
    let negative = words.iter().filter(|w| NEGATIVE_WORDS.contains(w)).count();

    if positive > negative {
        Sentiment::Positive
    } else if negative > positive {
        Sentiment::Negative
    } else {
        Sentiment::Neutral
    }
}

const FALLBACK_TEMPLATES: &[(&str, Sentiment)] = &[
    ("{} shares climb as analysts reiterate outperform rating", Sentiment::Positive),
    ("{} reports quarterly results ahead of expectations", Sentiment::Positive),
    ("{} announces expansion into new markets", Sentiment::Positive),
    ("{} trades flat as investors await guidance", Sentiment::Neutral),
    ("{} to present at upcoming industry conference", Sentiment::Neutral),
    ("{} sees options activity pick up ahead of earnings", Sentiment::Neutral),
    ("{} slips after cautious outlook from management", Sentiment::Negative),
    ("{} faces margin pressure amid rising costs", Sentiment::Negative),
];

/// Deterministic stand-in headlines for when the news feed is down or empty.
///
/// The same symbol, limit and `now` always give the same items.
pub fn fallback_news(symbol: &str, limit: usize, now: DateTime<Utc>) -> Vec<NewsItem> {
    let seed = symbol
        .bytes()
        .fold(0xcbf2_9ce4_8422_2325u64, |acc, b| (acc ^ b as u64).wrapping_mul(0x0100_0000_01b3));
    let mut rng = StdRng::seed_from_u64(seed);

    (0..limit)
        .map(|i| {
            let (template, sentiment) = FALLBACK_TEMPLATES[rng.random_range(0..FALLBACK_TEMPLATES.len())];
            let hours_ago = (i as i64) * 3 + rng.random_range(0..3) as i64;
            let headline = template.replace("{}", symbol);
            NewsItem {
                id: format!("fallback-{}-{}", symbol, i),
                summary: format!("{}. Live news is unavailable; this item was generated locally.", headline),
                headline,
                source: "Local".to_string(),
                url: String::new(),
                timestamp: (now - Duration::hours(hours_ago)).timestamp(),
                sentiment,
            }
        })
        .collect()
}

/// Main news service
pub struct NewsService {
    provider: Option<Arc<dyn NewsProvider>>,
}

impl NewsService {
    pub fn new(provider: Option<Arc<dyn NewsProvider>>) -> Self {
        Self { provider }
    }

    pub fn from_config(config: &NewsConfig, timeout: StdDuration) -> Self {
        let provider: Option<Arc<dyn NewsProvider>> = match (config.enabled, &config.api_key) {
            (true, Some(api_key)) => match FinnhubProvider::new(api_key.clone(), config.lookback_days, timeout) {
                Ok(provider) => {
                    info!("Initializing Finnhub news provider");
                    Some(Arc::new(provider))
                }
                Err(e) => {
                    warn!("Could not build news provider, using local fallback: {}", e);
                    None
                }
            },
            (true, None) => {
                warn!("NEWS_ENABLED but FINNHUB_API_KEY is not set, using local fallback");
                None
            }
            (false, _) => None,
        };
        Self::new(provider)
    }

    /// News for `symbol`, degrading to [`fallback_news`] on error or an empty feed.
    pub async fn fetch_news(&self, symbol: &str, limit: usize) -> Vec<NewsItem> {
        let symbol = normalize_symbol(symbol);
        let limit = limit.clamp(1, MAX_NEWS_LIMIT);

        if let Some(provider) = &self.provider {
            match provider.fetch_news(&symbol, limit).await {
                Ok(items) if !items.is_empty() => return items,
                Ok(_) => info!("No news returned for {}, using local fallback", symbol),
                Err(e) => warn!("News fetch failed for {}, using local fallback: {}", symbol, e),
            }
        }

        fallback_news(&symbol, limit, Utc::now())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StaticNews(Result<Vec<NewsItem>, ()>);

    #[async_trait]
    impl NewsProvider for StaticNews {
        async fn fetch_news(&self, _symbol: &str, _limit: usize) -> Result<Vec<NewsItem>, AppError> {
            self.0
                .clone()
                .map_err(|_| AppError::External("malformed payload".into()))
        }
    }

    fn item(headline: &str) -> NewsItem {
        NewsItem {
            id: "1".into(),
            headline: headline.into(),
            summary: String::new(),
            source: "Wire".into(),
            url: "https://example.com".into(),
            timestamp: 1_700_000_000,
            sentiment: Sentiment::Neutral,
        }
    }

    #[test]
    fn test_fallback_is_deterministic() {
        let now = Utc::now();
        let a = fallback_news("AAPL", 5, now);
        let b = fallback_news("AAPL", 5, now);

        assert_eq!(a, b);
        assert_eq!(a.len(), 5);
        assert!(a.iter().all(|n| n.headline.contains("AAPL")));
        assert!(a.iter().all(|n| n.timestamp <= now.timestamp()));
    }

    #[test]
    fn test_classify_sentiment() {
        assert_eq!(classify_sentiment("Apple beats estimates, shares surge"), Sentiment::Positive);
        assert_eq!(classify_sentiment("Tesla faces probe after recall"), Sentiment::Negative);
        assert_eq!(classify_sentiment("Microsoft holds annual meeting"), Sentiment::Neutral);
    }

    #[tokio::test]
    async fn test_provider_error_degrades_to_fallback() {
        let service = NewsService::new(Some(Arc::new(StaticNews(Err(())))));
        let news = service.fetch_news("msft", 3).await;

        assert_eq!(news.len(), 3);
        assert!(news.iter().all(|n| n.id.starts_with("fallback-MSFT")));
    }

    #[tokio::test]
    async fn test_empty_feed_degrades_to_fallback() {
        let service = NewsService::new(Some(Arc::new(StaticNews(Ok(vec![])))));
        let news = service.fetch_news("NVDA", 2).await;
        assert_eq!(news.len(), 2);
        assert_eq!(news[0].source, "Local");
    }

    #[tokio::test]
    async fn test_live_news_passes_through() {
        let service = NewsService::new(Some(Arc::new(StaticNews(Ok(vec![item("Live headline")])))));
        let news = service.fetch_news("AAPL", 5).await;
        assert_eq!(news, vec![item("Live headline")]);
    }
}
