mod common;

use std::sync::Arc;

use uuid::Uuid;

use common::{test_state, StubProvider};
use stockdash::db::{MemoryTable, RemoteBackend, RemoteTable};
use stockdash::models::{AlertCondition, CreateAlertRequest, CreatePosition, NotificationCategory, Position};
use stockdash::services::{alert_service, position_service, watchlist_service};
use stockdash::store::{JsonFileStorage, LocalStore};

fn position(symbol: &str, units: f64, avg_cost: f64) -> CreatePosition {
    CreatePosition {
        symbol: symbol.into(),
        units,
        avg_cost,
        current_price: None,
    }
}

#[tokio::test]
async fn price_refresh_fills_in_profit_and_loss() {
    let provider = StubProvider::with_prices(&[("AAPL", 110.0)]);
    let state = test_state(provider, None);

    let created = position_service::create(&state.writer, position("AAPL", 10.0, 100.0)).await.unwrap();
    assert!(!created.has_price());

    let refresh = state.dashboard.refresh_prices().await.unwrap();
    assert_eq!(refresh.positions_updated, 1);

    let (positions, summary) = position_service::list(&state.writer);
    assert_eq!(positions[0].purchase_value(), 1000.0);
    assert_eq!(positions[0].market_value(), 1100.0);
    assert_eq!(positions[0].profit_loss(), 100.0);
    assert_eq!(positions[0].profit_loss_percent(), 10.0);
    assert_eq!(summary.profit_loss, 100.0);

    // Same price again changes nothing.
    let refresh = state.dashboard.refresh_prices().await.unwrap();
    assert_eq!(refresh.positions_updated, 0);
}

#[tokio::test]
async fn unknown_symbol_keeps_position_unpriced() {
    let provider = StubProvider::with_prices(&[("AAPL", 190.0)]);
    let state = test_state(provider, None);
    position_service::create(&state.writer, position("ZZZZINVALID", 5.0, 10.0)).await.unwrap();

    let refresh = state.dashboard.refresh_prices().await.unwrap();

    assert_eq!(refresh.available, 0);
    let (positions, summary) = position_service::list(&state.writer);
    assert!(!positions[0].has_price());
    assert_eq!(summary.priced_count, 0);
}

#[tokio::test]
async fn alert_fires_once_as_price_climbs() {
    let provider = StubProvider::with_prices(&[]);
    let state = test_state(provider.clone(), None);
    alert_service::create(
        &state.writer,
        CreateAlertRequest {
            symbol: "NVDA".into(),
            target_price: 100.0,
            condition: AlertCondition::Above,
        },
    )
    .await
    .unwrap();

    let mut fired = Vec::new();
    for price in [95.0, 99.0, 100.0, 101.0] {
        provider.set_price("NVDA", price);
        fired.push(state.dashboard.refresh_alerts().await.unwrap().alerts_fired);
    }

    assert_eq!(fired, vec![0, 0, 1, 0]);
    assert!(!alert_service::list(&state.writer)[0].active);
    let alerts: Vec<_> = state
        .notifications
        .recent(10)
        .into_iter()
        .filter(|n| n.category == NotificationCategory::Alert)
        .collect();
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].symbol.as_deref(), Some("NVDA"));
}

#[tokio::test]
async fn login_merges_local_and_remote_data() {
    let positions = Arc::new(MemoryTable::<Position>::new());
    let backend = RemoteBackend {
        positions: positions.clone(),
        watchlist: Arc::new(MemoryTable::new()),
        alerts: Arc::new(MemoryTable::new()),
    };
    let user_id = Uuid::new_v4();

    // Another device already saved MSFT for this user.
    let from_elsewhere = Position::new("MSFT", 2.0, 300.0, 0.0).unwrap();
    positions.insert(user_id, &from_elsewhere).await.unwrap();

    let state = test_state(StubProvider::with_prices(&[]), Some(backend));
    position_service::create(&state.writer, position("AAPL", 10.0, 100.0)).await.unwrap();
    watchlist_service::add(&state.writer, "TSLA").await.unwrap();

    let report = state.session.login(user_id).await.unwrap();
    assert!(!report.failed());

    let mut symbols = state.store.portfolio.symbols();
    symbols.sort();
    assert_eq!(symbols, vec!["AAPL", "MSFT"]);
    assert_eq!(positions.rows(user_id).len(), 2);
    assert_eq!(state.store.watchlist.symbols(), vec!["TSLA"]);

    // Logged in, a new position goes straight to the remote.
    position_service::create(&state.writer, position("GOOG", 1.0, 150.0)).await.unwrap();
    assert_eq!(positions.rows(user_id).len(), 3);
}

#[tokio::test]
async fn failed_remote_write_is_rolled_back() {
    let positions = Arc::new(MemoryTable::<Position>::new());
    let backend = RemoteBackend {
        positions: positions.clone(),
        watchlist: Arc::new(MemoryTable::new()),
        alerts: Arc::new(MemoryTable::new()),
    };
    let state = test_state(StubProvider::with_prices(&[]), Some(backend));
    state.session.login(Uuid::new_v4()).await;

    positions.set_failing(true);
    let result = position_service::create(&state.writer, position("AAPL", 10.0, 100.0)).await;

    assert!(result.is_err());
    assert!(state.store.portfolio.positions().is_empty());
    assert!(state.store.status().last_error.is_some());
    assert!(state
        .notifications
        .recent(5)
        .iter()
        .any(|n| n.category == NotificationCategory::Error));
}

#[tokio::test]
async fn local_data_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = Arc::new(LocalStore::new(Arc::new(JsonFileStorage::open(dir.path()).unwrap())));
        store.portfolio.add(&position("AAPL", 10.0, 100.0)).unwrap();
        store.watchlist.add("MSFT").unwrap();
    }

    let store = LocalStore::new(Arc::new(JsonFileStorage::open(dir.path()).unwrap()));
    store.hydrate();

    assert_eq!(store.portfolio.symbols(), vec!["AAPL"]);
    assert_eq!(store.watchlist.symbols(), vec!["MSFT"]);
}
