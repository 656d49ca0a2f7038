use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Quote;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntry {
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddWatchlistEntryRequest {
    pub symbol: String,
}

/// Entry joined with whatever quote the dashboard currently holds for it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistEntryResponse {
    pub symbol: String,
    pub added_at: DateTime<Utc>,
    pub quote: Option<Quote>,
}

impl WatchlistEntry {
    pub fn new(symbol: &str) -> Self {
        Self {
            symbol: symbol.to_string(),
            added_at: Utc::now(),
        }
    }
}
