use std::collections::HashMap;

use tracing::{debug, info};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateAlertRequest, NotificationCategory, PriceAlert, Quote, UpdateAlertRequest};
use crate::services::remote_writer::{alerts_table, RemoteWriter};
use crate::utils::normalize_symbol;

// ==============================================================================
// Alert CRUD
// ==============================================================================

pub fn list(writer: &RemoteWriter) -> Vec<PriceAlert> {
    writer.store().alerts.alerts()
}

pub async fn create(writer: &RemoteWriter, input: CreateAlertRequest) -> Result<PriceAlert, AppError> {
    let alerts = &writer.store().alerts;
    let mutation = alerts.add(&input)?;
    let mutation = writer.commit(mutation, alerts.collection(), alerts_table).await?;

    let alert = mutation.record().clone();
    info!(
        "Created alert {}: {} {} {:.2}",
        alert.id, alert.symbol, alert.condition, alert.target_price
    );
    Ok(alert)
}

pub async fn update(writer: &RemoteWriter, id: Uuid, input: UpdateAlertRequest) -> Result<PriceAlert, AppError> {
    let alerts = &writer.store().alerts;
    let mutation = alerts.update(id, &input)?;
    let mutation = writer.commit(mutation, alerts.collection(), alerts_table).await?;
    Ok(mutation.record().clone())
}

/// Manual re-arm or disarm.
pub async fn toggle(writer: &RemoteWriter, id: Uuid) -> Result<PriceAlert, AppError> {
    let alerts = &writer.store().alerts;
    let mutation = alerts.toggle(id)?;
    let mutation = writer.commit(mutation, alerts.collection(), alerts_table).await?;
    Ok(mutation.record().clone())
}

pub async fn delete(writer: &RemoteWriter, id: Uuid) -> Result<(), AppError> {
    let alerts = &writer.store().alerts;
    let mutation = alerts.remove(id)?;
    writer.commit(mutation, alerts.collection(), alerts_table).await?;
    Ok(())
}

// ==============================================================================
// Alert Evaluation
// ==============================================================================

/// Fire every armed alert on `symbol` that `price` satisfies.
///
/// Each alert fires at most once: the flip to inactive happens under the store lock, so
/// repeated or overlapping calls with the same price cannot fire it again. A price of 0
/// means no data and is never evaluated.
pub async fn check_price(writer: &RemoteWriter, symbol: &str, price: f64) -> Vec<PriceAlert> {
    if price <= 0.0 {
        debug!("Skipping alert check for {}: no price", symbol);
        return Vec::new();
    }

    let symbol = normalize_symbol(symbol);
    let fired = writer.store().alerts.fire_matching(&symbol, price);
    if fired.is_empty() {
        return fired;
    }

    for alert in &fired {
        info!(
            "🔔 Alert {} fired: {} at {:.2} ({} {:.2})",
            alert.id, alert.symbol, price, alert.condition, alert.target_price
        );
        writer.notifications().notify(
            NotificationCategory::Alert,
            format!("{} price alert", alert.symbol),
            format!(
                "{} is at {:.2}, {} your target of {:.2}",
                alert.symbol, price, alert.condition, alert.target_price
            ),
            Some(alert.symbol.clone()),
        );
    }

    writer.propagate(&fired, alerts_table).await;
    fired
}

/// Run [`check_price`] for every available quote in a batch.
pub async fn check_quotes(writer: &RemoteWriter, quotes: &HashMap<String, Quote>) -> Vec<PriceAlert> {
    let mut fired = Vec::new();
    for quote in quotes.values().filter(|q| q.is_available()) {
        fired.extend(check_price(writer, &quote.symbol, quote.price).await);
    }
    fired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{MemoryTable, RemoteBackend};
    use crate::models::AlertCondition;
    use crate::services::notification_service::NotificationCenter;
    use crate::services::session_service::SessionService;
    use crate::store::{LocalStore, MemoryStorage};
    use std::sync::Arc;

    fn writer_with(session: SessionService) -> RemoteWriter {
        RemoteWriter::new(
            Arc::new(LocalStore::new(Arc::new(MemoryStorage::new()))),
            Arc::new(session),
            Arc::new(NotificationCenter::default()),
        )
    }

    fn request(target: f64, condition: AlertCondition) -> CreateAlertRequest {
        CreateAlertRequest {
            symbol: "AAPL".into(),
            target_price: target,
            condition,
        }
    }

    #[tokio::test]
    async fn test_above_alert_fires_once_over_price_sequence() {
        let writer = writer_with(SessionService::local_only());
        let alert = create(&writer, request(100.0, AlertCondition::Above)).await.unwrap();

        let mut fired = 0;
        for price in [95.0, 99.0, 100.0] {
            fired += check_price(&writer, "AAPL", price).await.len();
        }
        // Later ticks above the target do nothing either.
        fired += check_price(&writer, "AAPL", 104.0).await.len();

        assert_eq!(fired, 1);
        let stored = writer.store().alerts.get(alert.id).unwrap();
        assert!(!stored.active);
        assert!(stored.triggered_at.is_some());
        assert_eq!(writer.notifications().recent(10).len(), 1);
    }

    #[tokio::test]
    async fn test_alerts_on_same_symbol_fire_together() {
        let writer = writer_with(SessionService::local_only());
        create(&writer, request(100.0, AlertCondition::Above)).await.unwrap();
        create(&writer, request(105.0, AlertCondition::Above)).await.unwrap();

        let fired = check_price(&writer, "AAPL", 110.0).await;

        assert_eq!(fired.len(), 2);
        let toasts = writer
            .notifications()
            .recent(10)
            .into_iter()
            .filter(|n| n.category == NotificationCategory::Alert)
            .count();
        assert_eq!(toasts, 2);
        assert!(check_price(&writer, "AAPL", 110.0).await.is_empty());
    }

    #[tokio::test]
    async fn test_below_alert_uses_inclusive_bound() {
        let writer = writer_with(SessionService::local_only());
        create(&writer, request(50.0, AlertCondition::Below)).await.unwrap();

        assert!(check_price(&writer, "AAPL", 50.01).await.is_empty());
        assert_eq!(check_price(&writer, "aapl", 50.0).await.len(), 1);
    }

    #[tokio::test]
    async fn test_unavailable_price_is_never_evaluated() {
        let writer = writer_with(SessionService::local_only());
        create(&writer, request(10.0, AlertCondition::Below)).await.unwrap();

        assert!(check_price(&writer, "AAPL", 0.0).await.is_empty());
        assert_eq!(writer.store().alerts.active_for("AAPL").len(), 1);
    }

    #[tokio::test]
    async fn test_toggle_rearms_and_alert_can_fire_again() {
        let writer = writer_with(SessionService::local_only());
        let alert = create(&writer, request(100.0, AlertCondition::Above)).await.unwrap();

        check_price(&writer, "AAPL", 101.0).await;
        let rearmed = toggle(&writer, alert.id).await.unwrap();
        assert!(rearmed.active);
        assert!(rearmed.triggered_at.is_none());

        assert_eq!(check_price(&writer, "AAPL", 102.0).await.len(), 1);
    }

    #[tokio::test]
    async fn test_fired_alert_is_propagated_even_though_remote_is_best_effort() {
        let table = Arc::new(MemoryTable::<PriceAlert>::new());
        let mut backend = RemoteBackend::in_memory();
        backend.alerts = table.clone();
        let session = SessionService::new(Some(backend), None);
        let user = Uuid::new_v4();
        session.login(user).await;
        let writer = writer_with(session);

        create(&writer, request(100.0, AlertCondition::Above)).await.unwrap();
        check_price(&writer, "AAPL", 120.0).await;
        assert!(!table.rows(user)[0].active);

        // A remote outage does not undo the local transition.
        create(&writer, request(200.0, AlertCondition::Above)).await.unwrap();
        table.set_failing(true);
        assert_eq!(check_price(&writer, "AAPL", 250.0).await.len(), 1);
        assert!(writer.store().alerts.active_for("AAPL").is_empty());
    }
}
