use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use tracing::warn;
use uuid::Uuid;

use crate::models::{AlertCondition, PriceAlert};

// ==============================================================================
// Price Alert Rows
// ==============================================================================

#[derive(Debug, FromRow)]
pub struct PriceAlertRow {
    pub id: Uuid,
    pub symbol: String,
    pub target_price: f64,
    pub condition: String,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

impl PriceAlertRow {
    /// `None` when the stored condition is not one we understand.
    pub fn into_alert(self) -> Option<PriceAlert> {
        let Some(condition) = AlertCondition::from_str(&self.condition) else {
            warn!("Skipping alert {} with unknown condition '{}'", self.id, self.condition);
            return None;
        };
        Some(PriceAlert {
            id: self.id,
            symbol: self.symbol,
            target_price: self.target_price,
            condition,
            active: self.active,
            created_at: self.created_at,
            triggered_at: self.triggered_at,
        })
    }
}

// ==============================================================================
// Price Alert Queries
// ==============================================================================

pub async fn fetch_all(pool: &PgPool, user_id: Uuid) -> Result<Vec<PriceAlertRow>, sqlx::Error> {
    sqlx::query_as::<_, PriceAlertRow>(
        r#"
        SELECT id, symbol, target_price, condition, active, created_at, triggered_at
        FROM price_alerts
        WHERE user_id = $1
        ORDER BY created_at, id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
}

pub async fn insert(pool: &PgPool, user_id: Uuid, alert: &PriceAlert) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO price_alerts (id, user_id, symbol, target_price, condition, active, created_at, triggered_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO NOTHING
        "#,
    )
    .bind(alert.id)
    .bind(user_id)
    .bind(&alert.symbol)
    .bind(alert.target_price)
    .bind(alert.condition.as_str())
    .bind(alert.active)
    .bind(alert.created_at)
    .bind(alert.triggered_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn upsert(pool: &PgPool, user_id: Uuid, alert: &PriceAlert) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO price_alerts (id, user_id, symbol, target_price, condition, active, created_at, triggered_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        ON CONFLICT (id) DO UPDATE
        SET target_price = EXCLUDED.target_price,
            condition = EXCLUDED.condition,
            active = EXCLUDED.active,
            triggered_at = EXCLUDED.triggered_at
        WHERE price_alerts.user_id = EXCLUDED.user_id
        "#,
    )
    .bind(alert.id)
    .bind(user_id)
    .bind(&alert.symbol)
    .bind(alert.target_price)
    .bind(alert.condition.as_str())
    .bind(alert.active)
    .bind(alert.created_at)
    .bind(alert.triggered_at)
    .execute(pool)
    .await?;
    Ok(())
}

pub async fn delete(pool: &PgPool, user_id: Uuid, id: Uuid) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM price_alerts WHERE user_id = $1 AND id = $2")
        .bind(user_id)
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}
