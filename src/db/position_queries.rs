use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use crate::models::Position;

#[derive(Debug, FromRow)]
pub struct PositionRow {
    pub id: Uuid,
    pub symbol: String,
    pub units: f64,
    pub avg_cost: f64,
    pub created_at: DateTime<Utc>,
}

impl From<PositionRow> for Position {
    // Rows carry no price; the live price is filled in locally.
    fn from(row: PositionRow) -> Self {
        Position::restore(row.id, &row.symbol, row.units, row.avg_cost, 0.0, row.created_at)
    }
}

pub async fn fetch_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<PositionRow>, sqlx::Error> {
    sqlx::query_as::<_, PositionRow>(
        r#"
        SELECT id, symbol, units, avg_cost, created_at
        FROM positions
        WHERE user_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &PgPool, user_id: Uuid, position: &Position) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO positions (id, user_id, symbol, units, avg_cost, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(position.id)
    .bind(user_id)
    .bind(&position.symbol)
    .bind(position.units())
    .bind(position.avg_cost())
    .bind(position.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

/// Insert or overwrite in one statement. A row owned by another user is left alone.
pub async fn upsert(pool: &PgPool, user_id: Uuid, position: &Position) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO positions (id, user_id, symbol, units, avg_cost, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (id) DO UPDATE
        SET symbol = EXCLUDED.symbol,
            units = EXCLUDED.units,
            avg_cost = EXCLUDED.avg_cost
        WHERE positions.user_id = EXCLUDED.user_id
        "#,
    )
    .bind(position.id)
    .bind(user_id)
    .bind(&position.symbol)
    .bind(position.units())
    .bind(position.avg_cost())
    .bind(position.created_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM positions WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
