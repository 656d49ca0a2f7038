use async_trait::async_trait;
use tracing::{info, warn};

use crate::external::quote_provider::{QuoteProvider, QuoteProviderError};
use crate::models::Quote;

/// MultiProvider asks the primary provider first and falls back to the secondary.
///
/// Strategy:
/// 1. Fetch the whole batch from the primary provider
/// 2. If the primary fails outright, fetch the whole batch from the fallback
/// 3. If the primary answered but left symbols out, ask the fallback for just those
///    (a failure there keeps the primary's partial answer)
pub struct MultiProvider {
    primary: Box<dyn QuoteProvider>,
    fallback: Box<dyn QuoteProvider>,
}

impl MultiProvider {
    pub fn new(primary: Box<dyn QuoteProvider>, fallback: Box<dyn QuoteProvider>) -> Self {
        Self { primary, fallback }
    }
}

#[async_trait]
impl QuoteProvider for MultiProvider {
    fn name(&self) -> &'static str {
        "multi"
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError> {
        let mut quotes = match self.primary.fetch_quotes(symbols).await {
            Ok(quotes) => quotes,
            Err(QuoteProviderError::RateLimited) => {
                info!("⚠️ {} rate limited, trying {}", self.primary.name(), self.fallback.name());
                return self.fallback.fetch_quotes(symbols).await;
            }
            Err(e) => {
                warn!("{} failed for {} symbol(s): {}", self.primary.name(), symbols.len(), e);
                return self.fallback.fetch_quotes(symbols).await;
            }
        };

        let missing: Vec<String> = symbols
            .iter()
            .filter(|s| !quotes.iter().any(|q| &q.symbol == *s))
            .cloned()
            .collect();

        if missing.is_empty() {
            return Ok(quotes);
        }

        info!(
            "{} had no data for {:?}, asking {}",
            self.primary.name(),
            missing,
            self.fallback.name()
        );
        match self.fallback.fetch_quotes(&missing).await {
            Ok(extra) => quotes.extend(extra),
            Err(e) => warn!("{} gap fill failed: {}", self.fallback.name(), e),
        }
        Ok(quotes)
    }
}
