use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::external::quote_provider::{status_error, QuotePayload, QuoteProvider, QuoteProviderError};
use crate::models::Quote;

pub const DEFAULT_BASE_URL: &str = "https://query1.finance.yahoo.com";

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
}

impl YahooProvider {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, QuoteProviderError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent("Mozilla/5.0 (stockdash)")
            .build()
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }
}

// Minimal response structs (only what we need)
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YahooQuoteResponse {
    quote_response: YahooQuoteEnvelope,
}

#[derive(Debug, Deserialize)]
struct YahooQuoteEnvelope {
    result: Option<Vec<YahooQuote>>,
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct YahooQuote {
    symbol: String,
    short_name: Option<String>,
    long_name: Option<String>,
    regular_market_price: Option<f64>,
    regular_market_change: Option<f64>,
    regular_market_change_percent: Option<f64>,
    regular_market_open: Option<f64>,
    regular_market_day_high: Option<f64>,
    regular_market_day_low: Option<f64>,
    regular_market_previous_close: Option<f64>,
    regular_market_volume: Option<u64>,
    average_daily_volume3_month: Option<u64>,
    market_cap: Option<f64>,
    #[serde(rename = "trailingPE")]
    trailing_pe: Option<f64>,
    eps_trailing_twelve_months: Option<f64>,
    trailing_annual_dividend_yield: Option<f64>,
    fifty_two_week_high: Option<f64>,
    fifty_two_week_low: Option<f64>,
    regular_market_time: Option<i64>,
}

impl YahooQuoteResponse {
    pub fn into_quotes(self) -> Result<Vec<Quote>, QuoteProviderError> {
        if let Some(error) = self.quote_response.error.filter(|e| !e.is_null()) {
            return Err(QuoteProviderError::BadResponse(error.to_string()));
        }

        let results = self
            .quote_response
            .result
            .ok_or_else(|| QuoteProviderError::BadResponse("missing result".into()))?;

        Ok(results
            .into_iter()
            .map(|q| {
                let name = q
                    .long_name
                    .or(q.short_name)
                    .unwrap_or_else(|| q.symbol.clone());
                let last_updated = q
                    .regular_market_time
                    .and_then(|ts| DateTime::<Utc>::from_timestamp(ts, 0))
                    .unwrap_or_else(Utc::now);

                Quote {
                    symbol: q.symbol.to_uppercase(),
                    name,
                    price: q.regular_market_price.unwrap_or(0.0).max(0.0),
                    change: q.regular_market_change.unwrap_or(0.0),
                    change_percent: q.regular_market_change_percent.unwrap_or(0.0),
                    open: q.regular_market_open.unwrap_or(0.0),
                    high: q.regular_market_day_high.unwrap_or(0.0),
                    low: q.regular_market_day_low.unwrap_or(0.0),
                    previous_close: q.regular_market_previous_close.unwrap_or(0.0),
                    volume: q.regular_market_volume.unwrap_or(0),
                    average_volume: q.average_daily_volume3_month.unwrap_or(0),
                    market_cap: q.market_cap.unwrap_or(0.0),
                    pe_ratio: q.trailing_pe,
                    eps: q.eps_trailing_twelve_months,
                    // Yahoo reports a fraction; the dashboard shows percent.
                    dividend_yield: q.trailing_annual_dividend_yield.map(|y| y * 100.0),
                    fifty_two_week_high: q.fifty_two_week_high.unwrap_or(0.0),
                    fifty_two_week_low: q.fifty_two_week_low.unwrap_or(0.0),
                    last_updated,
                }
            })
            .collect())
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    fn name(&self) -> &'static str {
        "yahoo"
    }

    async fn fetch_quotes(&self, symbols: &[String]) -> Result<Vec<Quote>, QuoteProviderError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/v7/finance/quote", self.base_url);
        let joined = symbols.join(",");

        let resp = self
            .client
            .get(url)
            .query(&[("symbols", joined.as_str())])
            .send()
            .await
            .map_err(|e| QuoteProviderError::Network(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let body = resp
            .json::<YahooQuoteResponse>()
            .await
            .map_err(|e| QuoteProviderError::Parse(e.to_string()))?;

        QuotePayload::Yahoo(body).into_quotes()
    }
}
