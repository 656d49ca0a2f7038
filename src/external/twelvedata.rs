use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::external::quote_provider::{status_error, QuotePayload, QuoteProvider, QuoteProviderError};
use crate::models::Quote;

pub struct TwelveDataProvider {
    client: reqwest::Client,
    api_key: String,
}

impl TwelveDataProvider {
    pub fn new(api_key: String, timeout: Duration) -> Result<Self, QuoteProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        Ok(Self { client, api_key })
    }

    pub fn from_env(timeout: Duration) -> Result<Self, QuoteProviderError> {
        let api_key = std::env::var("TWELVEDATA_API_KEY")
            .map_err(|_| QuoteProviderError::BadResponse("TWELVEDATA_API_KEY not set".into()))?;
        Self::new(api_key, timeout)
    }
}

/// `/quote` answers a single symbol with a bare object and several symbols with an
/// object keyed by symbol. Either can carry per-symbol errors.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TwelveDataQuoteResponse {
    Single(TwelveDataEntry),
    Batch(HashMap<String, TwelveDataEntry>),
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum TwelveDataEntry {
    Quote(TwelveDataQuote),
    Error(TwelveDataError),
}

#[derive(Debug, Deserialize)]
pub struct TwelveDataError {
    code: u32,
    message: String,
}

#[derive(Debug, Deserialize)]
pub struct TwelveDataQuote {
    symbol: String,
    name: Option<String>,
    open: Option<String>,
    high: Option<String>,
    low: Option<String>,
    close: String,
    volume: Option<String>,
    previous_close: Option<String>,
    change: Option<String>,
    percent_change: Option<String>,
    average_volume: Option<String>,
    timestamp: Option<i64>,
    fifty_two_week: Option<TwelveDataRange>,
}

#[derive(Debug, Deserialize)]
struct TwelveDataRange {
    low: Option<String>,
    high: Option<String>,
}

fn number(value: &Option<String>) -> f64 {
    value
        .as_deref()
        .and_then(|v| v.parse::<f64>().ok())
        .unwrap_or(0.0)
}

fn count(value: &Option<String>) -> u64 {
    value
        .as_deref()
        .and_then(|v| v.parse::<f64>().ok())
        .map(|v| v.max(0.0) as u64)
        .unwrap_or(0)
}

impl TwelveDataQuote {
    fn into_quote(self) -> Result<Quote, QuoteProviderError> {
        let price = self
            .close
            .parse::<f64>()
            .map_err(|e| QuoteProviderError::Parse(format!("{} close '{}': {}", self.symbol, self.close, e)))?;
        let (low_52, high_52) = match &self.fifty_two_week {
            Some(range) => (number(&range.low), number(&range.high)),
            None => (0.0, 0.0),
        };
        let last_updated = self
            .timestamp
            .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
            .unwrap_or_else(Utc::now);

        Ok(Quote {
            name: self.name.clone().unwrap_or_else(|| self.symbol.clone()),
            symbol: self.symbol.to_uppercase(),
            price: price.max(0.0),
            change: number(&self.change),
            change_percent: number(&self.percent_change),
            open: number(&self.open),
            high: number(&self.high),
            low: number(&self.low),
            previous_close: number(&self.previous_close),
            volume: count(&self.volume),
            average_volume: count(&self.average_volume),
            // Not part of the /quote payload on the free tier.
            market_cap: 0.0,
            pe_ratio: None,
            eps: None,
            dividend_yield: None,
            fifty_two_week_high: high_52,
            fifty_two_week_low: low_52,
            last_updated,
        })
    }
}

impl TwelveDataQuoteResponse {
    pub fn into_quotes(self) -> Result<Vec<Quote>, QuoteProviderError> {
        match self {
            TwelveDataQuoteResponse::Single(TwelveDataEntry::Quote(quote)) => Ok(vec![quote.into_quote()?]),
            TwelveDataQuoteResponse::Single(TwelveDataEntry::Error(error)) => Err(entry_error(error)),
            TwelveDataQuoteResponse::Batch(entries) => {
                let mut quotes = Vec::with_capacity(entries.len());
                for (symbol, entry) in entries {
                    match entry {
                        TwelveDataEntry::Quote(quote) => quotes.push(quote.into_quote()?),
                        // Unknown symbols are left out; the fetcher marks them unavailable.
                        TwelveDataEntry::Error(error) if error.code == 429 => {
                            return Err(QuoteProviderError::RateLimited)
                        }
                        TwelveDataEntry::Error(error) => {
                            tracing::debug!("Twelve Data has no quote for {}: {}", symbol, error.message);
                        }
                    }
                }
                Ok(quotes)
            }
        }
    }
}

fn entry_error(error: TwelveDataError) -> QuoteProviderError {
    if error.code == 429 || error.message.contains("API rate limit") || error.message.contains("credits") {
        QuoteProviderError::RateLimited
    } else if error.code == 404 || error.code == 400 {
        // Single-symbol request for an unknown ticker: an empty batch, not a failure.
        QuoteProviderError::BadResponse(format!("not found: {}", error.message))
    } else {
        QuoteProviderError::BadResponse(error.message)
    }
}

#[async_trait]
impl QuoteProvider for TwelveDataProvider {
    fn name(&self) -> &'static str {
        "twelvedata"
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let url = "https://api.twelvedata.com/quote";
        let joined = symbols.join(",");

        let resp = self
            .client
            .get(url)
            .query(&[
                ("symbol", joined.as_str()),
                ("apikey", self.api_key.as_str()),
            ])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let body: TwelveDataQuoteResponse = resp
            .json()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        match QuotePayload::TwelveData(body).into_quotes() {
            Err(QuoteProviderError::BadResponse(msg)) if msg.starts_with("not found") => Ok(Vec::new()),
            other => other,
        }
    }
}
