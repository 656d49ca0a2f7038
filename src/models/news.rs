use serde::{Deserialize, Serialize};

/// A single news article
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub id: String,
    pub headline: String,
    pub summary: String,
    pub source: String,
    pub url: String,
    /// Unix seconds
    pub timestamp: i64,
    pub sentiment: Sentiment,
}

/// Sentiment classification for news
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Neutral,
    Negative,
}

impl Sentiment {
    pub fn weight(&self) -> f64 {
        match self {
            Sentiment::Positive => 1.0,
            Sentiment::Neutral => 0.0,
            Sentiment::Negative => -1.0,
        }
    }
}

impl std::fmt::Display for Sentiment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sentiment::Positive => write!(f, "positive"),
            Sentiment::Neutral => write!(f, "neutral"),
            Sentiment::Negative => write!(f, "negative"),
        }
    }
}

/// Bullish/bearish tallies from a social stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SocialSentiment {
    pub bullish: u32,
    pub bearish: u32,
    pub mentions: u32,
}

impl SocialSentiment {
    pub fn neutral() -> Self {
        Self::default()
    }

    /// Share of tagged messages that are bullish; `None` when nothing was tagged.
    pub fn bullish_ratio(&self) -> Option<f64> {
        let tagged = self.bullish + self.bearish;
        if tagged == 0 {
            return None;
        }
        Some(self.bullish as f64 / tagged as f64)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewsQueryParams {
    pub limit: Option<usize>,
}

/// Combined news and social mood for one symbol, as shown on the sentiment board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SentimentSnapshot {
    pub symbol: String,
    /// Mean news weight in [-1, 1].
    pub news_score: f64,
    pub positive: usize,
    pub neutral: usize,
    pub negative: usize,
    pub social: SocialSentiment,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl SentimentSnapshot {
    pub fn from_feeds(symbol: &str, news: &[NewsItem], social: SocialSentiment) -> Self {
        let count = |s: Sentiment| news.iter().filter(|n| n.sentiment == s).count();
        let news_score = if news.is_empty() {
            0.0
        } else {
            news.iter().map(|n| n.sentiment.weight()).sum::<f64>() / news.len() as f64
        };
        Self {
            symbol: symbol.to_string(),
            news_score,
            positive: count(Sentiment::Positive),
            neutral: count(Sentiment::Neutral),
            negative: count(Sentiment::Negative),
            social,
            updated_at: chrono::Utc::now(),
        }
    }
}
