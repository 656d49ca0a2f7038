use std::sync::Arc;

use chrono::Utc;
use futures::future::join_all;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::{
    Fundamentals, NewsItem, Quote, Recommendation, RecommendationLabel, SocialSentiment, TechnicalSignals,
};
use crate::services::news_service::{NewsService, DEFAULT_NEWS_LIMIT};
use crate::services::quote_service::QuoteService;
use crate::services::social_sentiment_service::SocialSentimentService;

const BASE_SCORE: f64 = 50.0;
const TECHNICAL_BOUND: f64 = 20.0;
const FUNDAMENTAL_BOUND: f64 = 15.0;
const NEWS_BOUND: f64 = 10.0;
const SOCIAL_BOUND: f64 = 10.0;

impl TechnicalSignals {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            change_percent: quote.change_percent,
            range_position: quote.range_position(),
            volume_ratio: quote.volume_ratio(),
        }
    }
}

impl Fundamentals {
    pub fn from_quote(quote: &Quote) -> Self {
        Self {
            pe_ratio: quote.pe_ratio,
            eps: quote.eps,
            dividend_yield: quote.dividend_yield,
            market_cap: quote.market_cap,
        }
    }
}

/// One signal group's contribution, clamped to its bound, with the reasons behind it.
#[derive(Debug, Default)]
struct Contribution {
    points: f64,
    reasons: Vec<String>,
}

impl Contribution {
    fn add(&mut self, points: f64, reason: impl Into<String>) {
        self.points += points;
        self.reasons.push(reason.into());
    }

    fn bounded(mut self, bound: f64) -> Self {
        self.points = self.points.clamp(-bound, bound);
        self
    }
}

fn technical_contribution(signals: &TechnicalSignals) -> Contribution {
    let mut c = Contribution::default();
    let change = signals.change_percent;

    if change > 2.0 {
        c.add(8.0, format!("Strong daily gain of {:.2}%", change));
    } else if change > 0.5 {
        c.add(4.0, format!("Positive daily move of {:.2}%", change));
    } else if change < -2.0 {
        c.add(-8.0, format!("Sharp daily drop of {:.2}%", change));
    } else if change < -0.5 {
        c.add(-4.0, format!("Negative daily move of {:.2}%", change));
    }

    if let Some(position) = signals.range_position {
        if position >= 0.9 {
            c.add(6.0, "Trading near its 52-week high");
        } else if position >= 0.6 {
            c.add(3.0, "Upper half of its 52-week range");
        } else if position <= 0.1 {
            c.add(-6.0, "Trading near its 52-week low");
        } else if position <= 0.4 {
            c.add(-3.0, "Lower half of its 52-week range");
        }
    }

    if let Some(ratio) = signals.volume_ratio {
        if ratio > 1.5 && change > 0.0 {
            c.add(4.0, format!("Buying volume {:.1}x average", ratio));
        } else if ratio > 1.5 && change < 0.0 {
            c.add(-4.0, format!("Selling volume {:.1}x average", ratio));
        }
    }

    c.bounded(TECHNICAL_BOUND)
}

fn fundamental_contribution(fundamentals: &Fundamentals) -> Contribution {
    let mut c = Contribution::default();

    if let Some(pe) = fundamentals.pe_ratio {
        if pe > 0.0 && pe < 15.0 {
            c.add(6.0, format!("Low P/E of {:.1}", pe));
        } else if (15.0..=25.0).contains(&pe) {
            c.add(3.0, format!("Moderate P/E of {:.1}", pe));
        } else if pe > 40.0 {
            c.add(-5.0, format!("Rich P/E of {:.1}", pe));
        }
    }

    if let Some(eps) = fundamentals.eps {
        if eps < 0.0 {
            c.add(-5.0, "Negative earnings per share");
        }
    }

    if let Some(dividend) = fundamentals.dividend_yield {
        if dividend > 2.0 {
            c.add(3.0, format!("Dividend yield of {:.2}%", dividend));
        }
    }

    if fundamentals.market_cap > 200e9 {
        c.add(2.0, "Mega-cap stability");
    }

    c.bounded(FUNDAMENTAL_BOUND)
}

fn news_contribution(news: &[NewsItem]) -> Contribution {
    let mut c = Contribution::default();
    if news.is_empty() {
        return c;
    }

    let average = news.iter().map(|n| n.sentiment.weight()).sum::<f64>() / news.len() as f64;
    let points = average * NEWS_BOUND;
    if points.abs() >= 1.0 {
        let tone = if points > 0.0 { "positive" } else { "negative" };
        c.add(points, format!("News flow is mostly {} ({} items)", tone, news.len()));
    }
    c.bounded(NEWS_BOUND)
}

fn social_contribution(social: &SocialSentiment) -> Contribution {
    let mut c = Contribution::default();
    if let Some(ratio) = social.bullish_ratio() {
        let points = (ratio - 0.5) * 20.0;
        if points.abs() >= 1.0 {
            c.add(points, format!("{:.0}% of social posts are bullish", ratio * 100.0));
        }
    }
    c.bounded(SOCIAL_BOUND)
}

/// Deterministic 0-100 score for one symbol.
///
/// Technicals and fundamentals only count when the quote has a real price.
pub fn score(
    quote: &Quote,
    technicals: &TechnicalSignals,
    fundamentals: &Fundamentals,
    news: &[NewsItem],
    social: &SocialSentiment,
) -> Recommendation {
    let mut groups = Vec::with_capacity(4);
    if quote.is_available() {
        groups.push(technical_contribution(technicals));
        groups.push(fundamental_contribution(fundamentals));
    }
    groups.push(news_contribution(news));
    groups.push(social_contribution(social));

    let total = BASE_SCORE + groups.iter().map(|g| g.points).sum::<f64>();
    let score = (total.clamp(0.0, 100.0) * 10.0).round() / 10.0;

    let mut reasons: Vec<String> = groups.into_iter().flat_map(|g| g.reasons).collect();
    if !quote.is_available() {
        reasons.insert(0, "Price data unavailable".to_string());
    }

    Recommendation {
        symbol: quote.symbol.clone(),
        score,
        label: RecommendationLabel::from_score(score),
        reasons,
        generated_at: Utc::now(),
    }
}

/// Gathers the inputs for [`score`] from the live feeds.
pub struct RecommendationService {
    quotes: Arc<QuoteService>,
    news: Arc<NewsService>,
    social: Arc<SocialSentimentService>,
}

impl RecommendationService {
    pub fn new(quotes: Arc<QuoteService>, news: Arc<NewsService>, social: Arc<SocialSentimentService>) -> Self {
        Self { quotes, news, social }
    }

    pub async fn recommend(&self, symbol: &str) -> Result<Recommendation, AppError> {
        let quote = self.quotes.fetch_quote(symbol).await?;
        Ok(self.score_quote(&quote).await)
    }

    /// Scores every symbol in one quote batch. Symbols are scored concurrently.
    pub async fn recommend_all(&self, symbols: &[String]) -> Result<Vec<Recommendation>, AppError> {
        if symbols.is_empty() {
            return Ok(Vec::new());
        }
        let quotes = self.quotes.fetch_quotes(symbols).await?;

        let mut ordered: Vec<&Quote> = quotes.values().collect();
        ordered.sort_by(|a, b| a.symbol.cmp(&b.symbol));

        let mut recommendations = join_all(ordered.into_iter().map(|q| self.score_quote(q))).await;
        recommendations.sort_by(|a, b| b.score.total_cmp(&a.score));

        info!("Scored {} symbol(s)", recommendations.len());
        Ok(recommendations)
    }

    async fn score_quote(&self, quote: &Quote) -> Recommendation {
        let (news, social) = tokio::join!(
            self.news.fetch_news(&quote.symbol, DEFAULT_NEWS_LIMIT),
            self.social.fetch(&quote.symbol)
        );
        if !quote.is_available() {
            warn!("Scoring {} without price data", quote.symbol);
        }
        score(
            quote,
            &TechnicalSignals::from_quote(quote),
            &Fundamentals::from_quote(quote),
            &news,
            &social,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Sentiment;

    fn quote(price: f64) -> Quote {
        let mut q = Quote::unavailable("AAPL");
        q.name = "Apple Inc.".into();
        q.price = price;
        q
    }

    fn news(sentiment: Sentiment, n: usize) -> Vec<NewsItem> {
        (0..n)
            .map(|i| NewsItem {
                id: i.to_string(),
                headline: "h".into(),
                summary: String::new(),
                source: "s".into(),
                url: String::new(),
                timestamp: 0,
                sentiment,
            })
            .collect()
    }

    fn run(q: &Quote, news: &[NewsItem], social: SocialSentiment) -> Recommendation {
        score(q, &TechnicalSignals::from_quote(q), &Fundamentals::from_quote(q), news, &social)
    }

    #[test]
    fn test_score_is_deterministic() {
        let mut q = quote(180.0);
        q.change_percent = 1.2;
        q.pe_ratio = Some(22.0);
        let items = news(Sentiment::Positive, 3);
        let social = SocialSentiment { bullish: 7, bearish: 3, mentions: 12 };

        let a = run(&q, &items, social);
        let b = run(&q, &items, social);

        assert_eq!(a.score, b.score);
        assert_eq!(a.label, b.label);
        assert_eq!(a.reasons, b.reasons);
    }

    #[test]
    fn test_neutral_inputs_hold_at_base() {
        let r = run(&quote(100.0), &[], SocialSentiment::neutral());
        assert_eq!(r.score, 50.0);
        assert_eq!(r.label, RecommendationLabel::Hold);
    }

    #[test]
    fn test_everything_bullish_stays_in_range_and_buys() {
        let mut q = quote(199.0);
        q.change_percent = 5.0;
        q.fifty_two_week_low = 100.0;
        q.fifty_two_week_high = 200.0;
        q.volume = 3_000_000;
        q.average_volume = 1_000_000;
        q.pe_ratio = Some(10.0);
        q.dividend_yield = Some(3.0);
        q.market_cap = 3e12;

        let r = run(&q, &news(Sentiment::Positive, 5), SocialSentiment { bullish: 10, bearish: 0, mentions: 10 });

        assert!(r.score <= 100.0);
        assert_eq!(r.score, 50.0 + 18.0 + 11.0 + 10.0 + 10.0);
        assert_eq!(r.label, RecommendationLabel::Buy);
    }

    #[test]
    fn test_everything_bearish_sells_and_never_goes_negative() {
        let mut q = quote(101.0);
        q.change_percent = -6.0;
        q.fifty_two_week_low = 100.0;
        q.fifty_two_week_high = 200.0;
        q.volume = 3_000_000;
        q.average_volume = 1_000_000;
        q.pe_ratio = Some(80.0);
        q.eps = Some(-1.2);

        let r = run(&q, &news(Sentiment::Negative, 4), SocialSentiment { bullish: 0, bearish: 9, mentions: 9 });

        assert!(r.score >= 0.0);
        assert_eq!(r.score, 50.0 - 18.0 - 10.0 - 10.0 - 10.0);
        assert_eq!(r.label, RecommendationLabel::Sell);
    }

    #[test]
    fn test_unavailable_quote_ignores_price_signals() {
        let mut q = quote(0.0);
        q.change_percent = 9.0;
        q.pe_ratio = Some(5.0);

        let r = run(&q, &[], SocialSentiment::neutral());

        assert_eq!(r.score, 50.0);
        assert_eq!(r.reasons, vec!["Price data unavailable".to_string()]);
    }

    #[test]
    fn test_label_thresholds() {
        assert_eq!(RecommendationLabel::from_score(75.0), RecommendationLabel::Buy);
        assert_eq!(RecommendationLabel::from_score(74.9), RecommendationLabel::Hold);
        assert_eq!(RecommendationLabel::from_score(50.0), RecommendationLabel::Hold);
        assert_eq!(RecommendationLabel::from_score(49.9), RecommendationLabel::Sell);
    }
}
