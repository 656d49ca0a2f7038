use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context};
use uuid::Uuid;

use crate::models::AllocationLimits;
use crate::services::job_scheduler_service::DEFAULT_SYNC_CRON;
use crate::services::news_service::NewsConfig;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuoteProviderKind {
    Yahoo,
    TwelveData,
    /// Twelve Data first, Yahoo for failures and gaps.
    Multi,
}

impl QuoteProviderKind {
    pub fn parse(value: &str) -> anyhow::Result<Self> {
        match value.to_lowercase().as_str() {
            "yahoo" => Ok(Self::Yahoo),
            "twelvedata" => Ok(Self::TwelveData),
            "multi" => Ok(Self::Multi),
            other => bail!("Invalid QUOTE_PROVIDER: {}. Must be 'yahoo', 'twelvedata', or 'multi'", other),
        }
    }
}

/// Process configuration, read once at startup.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub database_url: Option<String>,
    pub quote_provider: QuoteProviderKind,
    pub yahoo_base_url: String,
    pub quote_cache_ttl: chrono::Duration,
    pub http_timeout: Duration,
    pub news: NewsConfig,
    pub sync_cron: String,
    pub dashboard_user: Option<Uuid>,
    pub allocation: AllocationLimits,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = var_or("BIND_ADDR", "0.0.0.0:3000")
            .parse::<SocketAddr>()
            .context("BIND_ADDR must be host:port")?;

        let dashboard_user = match std::env::var("DASHBOARD_USER_ID") {
            Ok(raw) if !raw.trim().is_empty() => {
                Some(Uuid::parse_str(raw.trim()).context("DASHBOARD_USER_ID must be a UUID")?)
            }
            _ => None,
        };

        let mut allocation = AllocationLimits::default();
        if let Ok(raw) = std::env::var("MAX_POSITION_PCT") {
            let pct = raw.parse::<f64>().context("MAX_POSITION_PCT must be a number")?;
            if !(pct > 0.0 && pct <= 100.0) {
                bail!("MAX_POSITION_PCT must be in (0, 100], got {}", pct);
            }
            allocation.max_position_pct = pct;
        }

        Ok(Self {
            bind_addr,
            data_dir: PathBuf::from(var_or("DATA_DIR", ".stockdash")),
            database_url: std::env::var("DATABASE_URL").ok().filter(|s| !s.trim().is_empty()),
            quote_provider: QuoteProviderKind::parse(&var_or("QUOTE_PROVIDER", "yahoo"))?,
            yahoo_base_url: var_or("YAHOO_BASE_URL", crate::external::yahoo::DEFAULT_BASE_URL),
            quote_cache_ttl: chrono::Duration::seconds(parse_or("QUOTE_CACHE_TTL_SECS", 30)?),
            http_timeout: Duration::from_secs(parse_or("HTTP_TIMEOUT_SECS", 10)?),
            news: NewsConfig::from_env(),
            sync_cron: var_or("SYNC_CRON", DEFAULT_SYNC_CRON),
            dashboard_user,
            allocation,
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(name) {
        Ok(raw) => raw.trim().parse::<T>().with_context(|| format!("{} is not valid: '{}'", name, raw)),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_names() {
        assert_eq!(QuoteProviderKind::parse("Yahoo").unwrap(), QuoteProviderKind::Yahoo);
        assert_eq!(QuoteProviderKind::parse("multi").unwrap(), QuoteProviderKind::Multi);
        assert!(QuoteProviderKind::parse("alphavantage").is_err());
    }
}
