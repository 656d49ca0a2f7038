use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, error, info};

use crate::errors::AppError;
use crate::external::quote_provider::QuoteProvider;
use crate::models::Quote;
use crate::services::quote_cache::QuoteCache;
use crate::utils::{is_valid_symbol, normalize_symbol, normalize_symbols};

/// Batched, cached quote lookups.
///
/// Every distinct requested symbol gets a key in the result; anything the upstream did
/// not return comes back as [`Quote::unavailable`]. An upstream failure fails the whole
/// batch and is not retried here; pollers simply try again on their next tick.
pub struct QuoteService {
    provider: Arc<dyn QuoteProvider>,
    cache: QuoteCache,
}

impl QuoteService {
    pub fn new(provider: Arc<dyn QuoteProvider>, cache: QuoteCache) -> Self {
        Self { provider, cache }
    }

    pub fn cache(&self) -> &QuoteCache {
        &self.cache
    }

    pub async fn fetch_quotes<S: AsRef<str>>(&self, symbols: &[S]) -> Result<HashMap<String, Quote>, AppError> {
        let symbols = normalize_symbols(symbols);
        if symbols.is_empty() {
            return Ok(HashMap::new());
        }

        let signature = QuoteCache::signature(&symbols);
        if let Some(cached) = self.cache.get(&signature) {
            debug!("Quote cache hit for [{}]", signature);
            return Ok(cached);
        }

        let (valid, invalid): (Vec<String>, Vec<String>) =
            symbols.iter().cloned().partition(|s| is_valid_symbol(s));

        let fetched = if valid.is_empty() {
            Vec::new()
        } else {
            self.provider.fetch_quotes(&valid).await.map_err(|e| {
                error!("{} quote fetch failed for [{}]: {}", self.provider.name(), signature, e);
                AppError::from(e)
            })?
        };

        let mut by_symbol: HashMap<String, Quote> = fetched
            .into_iter()
            .filter(|q| symbols.contains(&q.symbol))
            .map(|q| (q.symbol.clone(), q))
            .collect();

        let mut missing = invalid;
        for symbol in &symbols {
            if !by_symbol.contains_key(symbol) {
                if !missing.contains(symbol) {
                    missing.push(symbol.clone());
                }
                by_symbol.insert(symbol.clone(), Quote::unavailable(symbol));
            }
        }
        if !missing.is_empty() {
            info!("No quote data for {:?}, marked unavailable", missing);
        }

        self.cache.insert(signature, by_symbol.clone());
        Ok(by_symbol)
    }

    pub async fn fetch_quote(&self, symbol: &str) -> Result<Quote, AppError> {
        let mut quotes = self.fetch_quotes(&[symbol]).await?;
        let symbol = normalize_symbol(symbol);
        quotes
            .remove(&symbol)
            .ok_or_else(|| AppError::Validation(format!("invalid symbol: '{}'", symbol)))
    }
}
