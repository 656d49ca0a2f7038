pub mod alert_queries;
pub mod memory;
pub mod position_queries;
pub mod postgres;
pub mod watchlist_queries;

use std::sync::Arc;

use async_trait::async_trait;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{Position, PriceAlert, WatchlistEntry};
use crate::store::Record;

pub use memory::MemoryTable;

/// One user-scoped table on the hosted backend.
///
/// `insert` must be idempotent: inserting a record whose key already exists is a no-op.
/// `upsert` writes the record in one step, replacing any row with the same key.
#[async_trait]
pub trait RemoteTable<T: Record>: Send + Sync {
    async fn select_all(&self, user_id: Uuid) -> Result<Vec<T>, AppError>;
    async fn insert(&self, user_id: Uuid, item: &T) -> Result<(), AppError>;
    async fn upsert(&self, user_id: Uuid, item: &T) -> Result<(), AppError>;
    async fn delete(&self, user_id: Uuid, key: &T::Key) -> Result<(), AppError>;
}

/// The three remote tables the dashboard syncs against.
#[derive(Clone)]
pub struct RemoteBackend {
    pub positions: Arc<dyn RemoteTable<Position>>,
    pub watchlist: Arc<dyn RemoteTable<WatchlistEntry>>,
    pub alerts: Arc<dyn RemoteTable<PriceAlert>>,
}

impl RemoteBackend {
    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            positions: Arc::new(postgres::PgPositions::new(pool.clone())),
            watchlist: Arc::new(postgres::PgWatchlist::new(pool.clone())),
            alerts: Arc::new(postgres::PgAlerts::new(pool)),
        }
    }

    pub fn in_memory() -> Self {
        Self {
            positions: Arc::new(MemoryTable::<Position>::new()),
            watchlist: Arc::new(MemoryTable::<WatchlistEntry>::new()),
            alerts: Arc::new(MemoryTable::<PriceAlert>::new()),
        }
    }
}
