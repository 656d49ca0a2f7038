use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::models::SocialSentiment;
use crate::utils::normalize_symbol;

#[async_trait]
pub trait SocialSentimentProvider: Send + Sync {
    async fn fetch(&self, symbol: &str) -> Result<SocialSentiment, AppError>;
}

/// StockTwits public symbol stream.
pub struct StockTwitsProvider {
    client: Client,
    base_url: String,
}

pub const STOCKTWITS_BASE_URL: &str = "https://api.stocktwits.com/api/2";

impl StockTwitsProvider {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::External(format!("Social client error: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct StreamResponse {
    #[serde(default)]
    messages: Vec<StreamMessage>,
}

#[derive(Debug, Deserialize)]
struct StreamMessage {
    entities: Option<MessageEntities>,
}

#[derive(Debug, Deserialize)]
struct MessageEntities {
    sentiment: Option<MessageSentiment>,
}

#[derive(Debug, Deserialize)]
struct MessageSentiment {
    basic: Option<String>,
}

impl StreamResponse {
    pub fn tally(&self) -> SocialSentiment {
        let mut sentiment = SocialSentiment {
            mentions: self.messages.len() as u32,
            ..SocialSentiment::default()
        };

        for message in &self.messages {
            let basic = message
                .entities
                .as_ref()
                .and_then(|e| e.sentiment.as_ref())
                .and_then(|s| s.basic.as_deref());
            match basic {
                Some("Bullish") => sentiment.bullish += 1,
                Some("Bearish") => sentiment.bearish += 1,
                _ => {}
            }
        }
        sentiment
    }
}

#[async_trait]
impl SocialSentimentProvider for StockTwitsProvider {
    async fn fetch(&self, symbol: &str) -> Result<SocialSentiment, AppError> {
        let url = format!("{}/streams/symbol/{}.json", self.base_url, symbol);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AppError::External(format!("StockTwits request failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AppError::External(format!(
                "StockTwits returned {} for {}",
                response.status(),
                symbol
            )));
        }

        let body: StreamResponse = response
            .json()
            .await
            .map_err(|e| AppError::External(format!("Failed to parse StockTwits stream: {}", e)))?;

        Ok(body.tally())
    }
}

pub struct SocialSentimentService {
    provider: Option<Arc<dyn SocialSentimentProvider>>,
}

impl SocialSentimentService {
    pub fn new(provider: Option<Arc<dyn SocialSentimentProvider>>) -> Self {
        Self { provider }
    }

    /// Tallies for `symbol`; any failure reads as neutral.
    pub async fn fetch(&self, symbol: &str) -> SocialSentiment {
        let symbol = normalize_symbol(symbol);
        let Some(provider) = &self.provider else {
            return SocialSentiment::neutral();
        };

        match provider.fetch(&symbol).await {
            Ok(sentiment) => {
                debug!(
                    "Social sentiment for {}: {} bullish / {} bearish of {}",
                    symbol, sentiment.bullish, sentiment.bearish, sentiment.mentions
                );
                sentiment
            }
            Err(e) => {
                warn!("Social sentiment unavailable for {}: {}", symbol, e);
                SocialSentiment::neutral()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Failing;

    #[async_trait]
    impl SocialSentimentProvider for Failing {
        async fn fetch(&self, _symbol: &str) -> Result<SocialSentiment, AppError> {
            Err(AppError::External("503".into()))
        }
    }

    #[test]
    fn test_tally_counts_tagged_messages() {
        let raw = r#"{"messages": [
            {"entities": {"sentiment": {"basic": "Bullish"}}},
            {"entities": {"sentiment": {"basic": "Bullish"}}},
            {"entities": {"sentiment": {"basic": "Bearish"}}},
            {"entities": {"sentiment": null}},
            {}
        ]}"#;
        let body: StreamResponse = serde_json::from_str(raw).unwrap();
        let tally = body.tally();

        assert_eq!(tally.mentions, 5);
        assert_eq!(tally.bullish, 2);
        assert_eq!(tally.bearish, 1);
    }

    #[tokio::test]
    async fn test_failure_reads_as_neutral() {
        let service = SocialSentimentService::new(Some(Arc::new(Failing)));
        let sentiment = service.fetch("AAPL").await;
        assert_eq!(sentiment, SocialSentiment::neutral());
        assert_eq!(sentiment.bullish_ratio(), None);
    }
}
