use async_trait::async_trait;
use thiserror::Error;

use crate::external::twelvedata::TwelveDataQuoteResponse;
use crate::external::yahoo::YahooQuoteResponse;
use crate::models::Quote;

#[derive(Debug, Error)]
pub enum QuoteProviderError {
    #[error("network error: {0}")]
    Network(String),

    #[error("bad response: {0}")]
    BadResponse(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("rate limited")]
    RateLimited,
}

/// Raw upstream payloads, one variant per provider. Nothing outside `external`
/// ever sees these; they are turned into canonical [`Quote`]s right away.
#[derive(Debug)]
pub enum QuotePayload {
    Yahoo(YahooQuoteResponse),
    TwelveData(TwelveDataQuoteResponse),
}

impl QuotePayload {
    pub fn into_quotes(self) -> Result<Vec<Quote>, QuoteProviderError> {
        match self {
            QuotePayload::Yahoo(body) => body.into_quotes(),
            QuotePayload::TwelveData(body) => body.into_quotes(),
        }
    }
}

/// Batched quote source. Symbols the upstream does not know are simply absent from
/// the returned list; the whole call fails only when the batch does.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    fn name(&self) -> &'static str;

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError>;
}

/// Map a non-success HTTP status onto the provider error taxonomy.
pub(crate) fn status_error(status: reqwest::StatusCode, body: &str) -> QuoteProviderError {
    if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
        QuoteProviderError::RateLimited
    } else {
        QuoteProviderError::BadResponse(format!("HTTP {}: {}", status, body))
    }
}
