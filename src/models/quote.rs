use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const UNAVAILABLE_SUFFIX: &str = "(Unavailable)";

/// Point-in-time snapshot of a traded symbol.
///
/// Quotes are replaced wholesale on every successful fetch. A `price` of exactly 0
/// means "no data" and callers must not derive values (P/L, weights, alerts) from it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub symbol: String,
    pub name: String,
    pub price: f64,
    pub change: f64,
    pub change_percent: f64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub previous_close: f64,
    pub volume: u64,
    pub average_volume: u64,
    pub market_cap: f64,
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub fifty_two_week_high: f64,
    pub fifty_two_week_low: f64,
    pub last_updated: DateTime<Utc>,
}

impl Quote {
    /// Placeholder returned for a requested symbol the upstream had no data for.
    pub fn unavailable(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            name: format!("{} {}", symbol, UNAVAILABLE_SUFFIX),
            price: 0.0,
            change: 0.0,
            change_percent: 0.0,
            open: 0.0,
            high: 0.0,
            low: 0.0,
            previous_close: 0.0,
            volume: 0,
            average_volume: 0,
            market_cap: 0.0,
            pe_ratio: None,
            eps: None,
            dividend_yield: None,
            fifty_two_week_high: 0.0,
            fifty_two_week_low: 0.0,
            last_updated: Utc::now(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.price > 0.0
    }

    /// Where the price sits inside the 52-week range, 0.0 at the low and 1.0 at the high.
    pub fn range_position(&self) -> Option<f64> {
        let span = self.fifty_two_week_high - self.fifty_two_week_low;
        if !self.is_available() || span <= 0.0 {
            return None;
        }
        Some(((self.price - self.fifty_two_week_low) / span).clamp(0.0, 1.0))
    }

    pub fn volume_ratio(&self) -> Option<f64> {
        if self.average_volume == 0 {
            return None;
        }
        Some(self.volume as f64 / self.average_volume as f64)
    }
}
