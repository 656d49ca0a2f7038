use std::sync::Arc;

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;

use stockdash::app;
use stockdash::config::{AppConfig, QuoteProviderKind};
use stockdash::db::RemoteBackend;
use stockdash::external::multi_provider::MultiProvider;
use stockdash::external::quote_provider::QuoteProvider;
use stockdash::external::twelvedata::TwelveDataProvider;
use stockdash::external::yahoo::YahooProvider;
use stockdash::logging::{init_logging, LoggingConfig};
use stockdash::services::job_scheduler_service::{JobContext, JobSchedulerService};
use stockdash::services::news_service::NewsService;
use stockdash::services::quote_cache::QuoteCache;
use stockdash::services::quote_service::QuoteService;
use stockdash::services::social_sentiment_service::{SocialSentimentService, StockTwitsProvider, STOCKTWITS_BASE_URL};
use stockdash::state::AppState;
use stockdash::store::{JsonFileStorage, LocalStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize logging FIRST
    init_logging(LoggingConfig::from_env())?;

    let config = AppConfig::from_env()?;

    // Local data is restored before anything touches the network.
    let storage = JsonFileStorage::open(&config.data_dir)
        .with_context(|| format!("cannot open data dir {}", config.data_dir.display()))?;
    let store = Arc::new(LocalStore::new(Arc::new(storage)));
    store.hydrate();

    let backend = match &config.database_url {
        Some(database_url) => {
            let pool = PgPoolOptions::new()
                .max_connections(10)
                .connect(database_url)
                .await
                .context("cannot connect to DATABASE_URL")?;
            sqlx::migrate!("./migrations").run(&pool).await?;
            tracing::info!("🗄️ Remote backend connected");
            Some(RemoteBackend::postgres(pool))
        }
        None => {
            tracing::info!("💾 No DATABASE_URL, running local-only");
            None
        }
    };

    let provider = build_quote_provider(&config)?;
    let quotes = Arc::new(QuoteService::new(provider, QuoteCache::new(config.quote_cache_ttl)));
    let news = Arc::new(NewsService::from_config(&config.news, config.http_timeout));
    let social = match StockTwitsProvider::new(STOCKTWITS_BASE_URL, config.http_timeout) {
        Ok(provider) => SocialSentimentService::new(Some(Arc::new(provider))),
        Err(e) => {
            tracing::warn!("Social sentiment disabled: {}", e);
            SocialSentimentService::new(None)
        }
    };

    let state = AppState::new(store, backend, quotes.clone(), news, Arc::new(social), config.allocation);

    if let Some(user_id) = config.dashboard_user {
        if let Some(report) = state.session.login(user_id).await {
            if report.failed() {
                tracing::warn!("Initial sync for {} did not fully complete", user_id);
            }
        }
    }

    let mut scheduler = JobSchedulerService::new(
        JobContext {
            session: state.session.clone(),
            quotes,
        },
        config.sync_cron.clone(),
    )
    .await?;
    scheduler.start().await?;

    let dashboard = state.dashboard.clone();
    let app = app::create_app(state);

    let listener = TcpListener::bind(&config.bind_addr)
        .await
        .with_context(|| format!("cannot bind {}", config.bind_addr))?;
    tracing::info!("🚀 Stockdash backend running at http://{}/", config.bind_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    dashboard.unmount_all();
    scheduler.stop().await?;
    Ok(())
}

fn build_quote_provider(config: &AppConfig) -> anyhow::Result<Arc<dyn QuoteProvider>> {
    let provider: Arc<dyn QuoteProvider> = match config.quote_provider {
        QuoteProviderKind::Yahoo => {
            tracing::info!("📊 Using quote provider: Yahoo only");
            Arc::new(YahooProvider::new(&config.yahoo_base_url, config.http_timeout)?)
        }
        QuoteProviderKind::TwelveData => {
            tracing::info!("📊 Using quote provider: Twelve Data only");
            Arc::new(
                TwelveDataProvider::from_env(config.http_timeout)
                    .context("check TWELVEDATA_API_KEY")?,
            )
        }
        QuoteProviderKind::Multi => {
            tracing::info!("📊 Using quote provider: Multi-provider (Twelve Data + Yahoo fallback)");
            let primary = Box::new(
                TwelveDataProvider::from_env(config.http_timeout)
                    .context("check TWELVEDATA_API_KEY")?,
            );
            let fallback = Box::new(YahooProvider::new(&config.yahoo_base_url, config.http_timeout)?);
            Arc::new(MultiProvider::new(primary, fallback))
        }
    };
    Ok(provider)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("🛑 Shutting down");
}
