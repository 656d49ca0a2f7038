use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationLimits {
    pub max_position_pct: f64,
    pub min_positions: usize,
}

impl Default for AllocationLimits {
    fn default() -> Self {
        Self {
            max_position_pct: 25.0,
            min_positions: 5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymbolWeight {
    pub symbol: String,
    pub market_value: f64,
    pub weight_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AllocationBreach {
    Overweight {
        symbol: String,
        weight_pct: f64,
        limit_pct: f64,
        /// Market value to sell to get back to the limit.
        trim_amount: f64,
    },
    UnderDiversified {
        holdings: usize,
        minimum: usize,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AllocationReport {
    pub total_market_value: f64,
    pub weights: Vec<SymbolWeight>,
    pub breaches: Vec<AllocationBreach>,
    /// Symbols left out because their price is unavailable.
    pub unpriced: Vec<String>,
}
