#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use stockdash::db::RemoteBackend;
use stockdash::external::quote_provider::{QuoteProvider, QuoteProviderError};
use stockdash::models::{AllocationLimits, Quote};
use stockdash::services::news_service::NewsService;
use stockdash::services::quote_cache::QuoteCache;
use stockdash::services::quote_service::QuoteService;
use stockdash::services::social_sentiment_service::SocialSentimentService;
use stockdash::state::AppState;
use stockdash::store::{LocalStore, MemoryStorage};

/// Upstream that knows a fixed set of prices, changeable between calls.
#[derive(Default)]
pub struct StubProvider {
    prices: Mutex<HashMap<String, f64>>,
}

impl StubProvider {
    pub fn with_prices(prices: &[(&str, f64)]) -> Arc<Self> {
        let provider = Self::default();
        for (symbol, price) in prices {
            provider.set_price(symbol, *price);
        }
        Arc::new(provider)
    }

    pub fn set_price(&self, symbol: &str, price: f64) {
        self.prices.lock().insert(symbol.to_string(), price);
    }
}

pub fn quote(symbol: &str, price: f64) -> Quote {
    Quote {
        symbol: symbol.to_string(),
        name: format!("{} Inc.", symbol),
        price,
        change: 0.0,
        change_percent: 0.0,
        open: price,
        high: price,
        low: price,
        previous_close: price,
        volume: 1_000_000,
        average_volume: 1_000_000,
        market_cap: 0.0,
        pe_ratio: None,
        eps: None,
        dividend_yield: None,
        fifty_two_week_high: price,
        fifty_two_week_low: price,
        last_updated: Utc::now(),
    }
}

#[async_trait]
impl QuoteProvider for StubProvider {
    fn name(&self) -> &'static str {
        "stub"
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError> {
        let prices = self.prices.lock();
        Ok(symbols
            .iter()
            .filter_map(|s| prices.get(s).map(|price| quote(s, *price)))
            .collect())
    }
}

/// Full app state over in-memory storage, no news or social providers, and a quote
/// cache that never serves a hit.
pub fn test_state(provider: Arc<StubProvider>, backend: Option<RemoteBackend>) -> AppState {
    let store = Arc::new(LocalStore::new(Arc::new(MemoryStorage::new())));
    let quotes = Arc::new(QuoteService::new(provider, QuoteCache::new(chrono::Duration::zero())));
    AppState::new(
        store,
        backend,
        quotes,
        Arc::new(NewsService::new(None)),
        Arc::new(SocialSentimentService::new(None)),
        AllocationLimits::default(),
    )
}
