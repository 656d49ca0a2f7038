use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::db::{alert_queries, position_queries, watchlist_queries, RemoteTable};
use crate::errors::AppError;
use crate::models::{Position, PriceAlert, WatchlistEntry};

pub struct PgPositions {
    pool: PgPool,
}

impl PgPositions {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteTable<Position> for PgPositions {
    async fn select_all(&self, user_id: Uuid) -> Result<Vec<Position>, AppError> {
        let rows = position_queries::fetch_all(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(Position::from).collect())
    }

    async fn insert(&self, user_id: Uuid, item: &Position) -> Result<(), AppError> {
        position_queries::insert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn upsert(&self, user_id: Uuid, item: &Position) -> Result<(), AppError> {
        position_queries::upsert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, key: &Uuid) -> Result<(), AppError> {
        position_queries::delete(&self.pool, user_id, *key).await?;
        Ok(())
    }
}

pub struct PgWatchlist {
    pool: PgPool,
}

impl PgWatchlist {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteTable<WatchlistEntry> for PgWatchlist {
    async fn select_all(&self, user_id: Uuid) -> Result<Vec<WatchlistEntry>, AppError> {
        let rows = watchlist_queries::fetch_all(&self.pool, user_id).await?;
        Ok(rows.into_iter().map(WatchlistEntry::from).collect())
    }

    async fn insert(&self, user_id: Uuid, item: &WatchlistEntry) -> Result<(), AppError> {
        watchlist_queries::insert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn upsert(&self, user_id: Uuid, item: &WatchlistEntry) -> Result<(), AppError> {
        watchlist_queries::upsert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, key: &String) -> Result<(), AppError> {
        watchlist_queries::delete(&self.pool, user_id, key).await?;
        Ok(())
    }
}

pub struct PgAlerts {
    pool: PgPool,
}

impl PgAlerts {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RemoteTable<PriceAlert> for PgAlerts {
    async fn select_all(&self, user_id: Uuid) -> Result<Vec<PriceAlert>, AppError> {
        let rows = alert_queries::fetch_all(&self.pool, user_id).await?;
        Ok(rows.into_iter().filter_map(|row| row.into_alert()).collect())
    }

    async fn insert(&self, user_id: Uuid, item: &PriceAlert) -> Result<(), AppError> {
        alert_queries::insert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn upsert(&self, user_id: Uuid, item: &PriceAlert) -> Result<(), AppError> {
        alert_queries::upsert(&self.pool, user_id, item).await?;
        Ok(())
    }

    async fn delete(&self, user_id: Uuid, key: &Uuid) -> Result<(), AppError> {
        alert_queries::delete(&self.pool, user_id, *key).await?;
        Ok(())
    }
}
