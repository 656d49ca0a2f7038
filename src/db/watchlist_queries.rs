use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::WatchlistEntry;

#[derive(Debug, FromRow)]
pub struct WatchlistRow {
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

impl From<WatchlistRow> for WatchlistEntry {
    fn from(row: WatchlistRow) -> Self {
        WatchlistEntry {
            symbol: row.symbol,
            added_at: row.added_at,
        }
    }
}

pub async fn fetch_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<WatchlistRow>, sqlx::Error> {
    sqlx::query_as::<_, WatchlistRow>(
        r#"
        SELECT symbol, added_at
        FROM watchlist_entries
        WHERE user_id = $1
        ORDER BY added_at, symbol
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &PgPool, user_id: Uuid, entry: &WatchlistEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO watchlist_entries (user_id, symbol, added_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, symbol) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(&entry.symbol)
    .bind(entry.added_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert(pool: &PgPool, user_id: Uuid, entry: &WatchlistEntry) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO watchlist_entries (user_id, symbol, added_at)
        VALUES ($1, $2, $3)
        ON CONFLICT (user_id, symbol) DO UPDATE SET added_at = EXCLUDED.added_at
        "#,
    )
    .bind(user_id)
    .bind(&entry.symbol)
    .bind(entry.added_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: Uuid, symbol: &str) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM watchlist_entries WHERE user_id = $1 AND symbol = $2")
        .bind(user_id)
        .bind(symbol)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
