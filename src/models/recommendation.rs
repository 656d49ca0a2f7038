use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Label derived purely from the final score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RecommendationLabel {
    Buy,
    Hold,
    Sell,
}

impl RecommendationLabel {
    pub fn from_score(score: f64) -> Self {
        if score >= 75.0 {
            RecommendationLabel::Buy
        } else if score >= 50.0 {
            RecommendationLabel::Hold
        } else {
            RecommendationLabel::Sell
        }
    }
}

impl std::fmt::Display for RecommendationLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecommendationLabel::Buy => write!(f, "Buy"),
            RecommendationLabel::Hold => write!(f, "Hold"),
            RecommendationLabel::Sell => write!(f, "Sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recommendation {
    pub symbol: String,
    pub score: f64,
    pub label: RecommendationLabel,
    pub reasons: Vec<String>,
    pub generated_at: DateTime<Utc>,
}

/// Momentum inputs, all optional because a fresh listing may lack history.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSignals {
    pub change_percent: f64,
    pub range_position: Option<f64>,
    pub volume_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Fundamentals {
    pub pe_ratio: Option<f64>,
    pub eps: Option<f64>,
    pub dividend_yield: Option<f64>,
    pub market_cap: f64,
}
