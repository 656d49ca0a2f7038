use anyhow::{bail, Context};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub loki_enabled: bool,
    pub loki_url: Option<String>,
    pub service_name: String,
    pub environment: String,
    pub log_level: String,
    /// Single-line output without targets, for terminals next to the dashboard.
    pub compact: bool,
}

impl LoggingConfig {
    pub fn from_env() -> Self {
        Self {
            loki_enabled: env_flag("LOKI_ENABLED"),
            loki_url: std::env::var("LOKI_URL").ok(),
            service_name: std::env::var("SERVICE_NAME").unwrap_or_else(|_| "stockdash".to_string()),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            log_level: std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "stockdash=info,tower_http=info,sqlx=warn".to_string()),
            compact: env_flag("LOG_COMPACT"),
        }
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.loki_enabled && self.loki_url.is_none() {
            bail!("LOKI_ENABLED is true but LOKI_URL is not set");
        }
        Ok(())
    }

    fn filter(&self) -> anyhow::Result<EnvFilter> {
        EnvFilter::try_new(&self.log_level).with_context(|| format!("invalid RUST_LOG '{}'", self.log_level))
    }
}

fn env_flag(name: &str) -> bool {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false)
}

pub fn init_logging(config: LoggingConfig) -> anyhow::Result<()> {
    config.validate()?;

    #[cfg(feature = "loki")]
    {
        if config.loki_enabled {
            if let Some(loki_url) = config.loki_url.clone() {
                return init_with_loki(config, &loki_url);
            }
        }
    }

    init_console_only(config)
}

fn init_console_only(config: LoggingConfig) -> anyhow::Result<()> {
    let registry = tracing_subscriber::registry().with(config.filter()?);
    if config.compact {
        registry.with(tracing_subscriber::fmt::layer().compact().with_target(false)).try_init()?;
    } else {
        registry.with(tracing_subscriber::fmt::layer()).try_init()?;
    }

    tracing::info!("📊 Console logging initialized ({})", config.environment);
    Ok(())
}

#[cfg(feature = "loki")]
fn init_with_loki(config: LoggingConfig, loki_url: &str) -> anyhow::Result<()> {
    let url = url::Url::parse(loki_url).with_context(|| format!("invalid LOKI_URL '{}'", loki_url))?;

    let (loki_layer, task) = tracing_loki::builder()
        .label("service", &config.service_name)?
        .label("environment", &config.environment)?
        .build_url(url)?;

    // Ships buffered log lines to Loki in the background.
    tokio::spawn(task);

    tracing_subscriber::registry()
        .with(config.filter()?)
        .with(tracing_subscriber::fmt::layer())
        .with(loki_layer)
        .try_init()?;

    tracing::info!("📊 Logging to console and Loki at {}", loki_url);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> LoggingConfig {
        LoggingConfig {
            loki_enabled: false,
            loki_url: None,
            service_name: "stockdash".into(),
            environment: "test".into(),
            log_level: "info".into(),
            compact: false,
        }
    }

    #[test]
    fn test_loki_requires_url() {
        let mut config = config();
        config.loki_enabled = true;
        assert!(config.validate().is_err());

        config.loki_url = Some("http://localhost:3100".into());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_bad_filter_is_reported() {
        let mut config = config();
        config.log_level = "stockdash=loud".into();
        assert!(config.filter().is_err());
    }
}
