use std::sync::Arc;

use uuid::Uuid;

use crate::errors::AppError;
use crate::models::{CreateAlertRequest, PriceAlert, UpdateAlertRequest};
use crate::store::collection::{PersistedCollection, Record};
use crate::store::mutation::Mutation;
use crate::store::storage::LocalStorage;
use crate::utils::parse_symbol;

impl Record for PriceAlert {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }
}

pub struct AlertStore {
    alerts: PersistedCollection<PriceAlert>,
}

impl AlertStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            alerts: PersistedCollection::new("alerts", storage),
        }
    }

    pub fn collection(&self) -> &PersistedCollection<PriceAlert> {
        &self.alerts
    }

    pub fn hydrate(&self) -> Result<usize, AppError> {
        self.alerts.hydrate()
    }

    pub fn alerts(&self) -> Vec<PriceAlert> {
        self.alerts.snapshot()
    }

    pub fn get(&self, id: Uuid) -> Option<PriceAlert> {
        self.alerts.get(&id)
    }

    pub fn active_for(&self, symbol: &str) -> Vec<PriceAlert> {
        self.alerts
            .snapshot()
            .into_iter()
            .filter(|a| a.active && a.symbol == symbol)
            .collect()
    }

    /// Symbols with at least one armed alert.
    pub fn active_symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for alert in self.alerts.snapshot().into_iter().filter(|a| a.active) {
            if !symbols.contains(&alert.symbol) {
                symbols.push(alert.symbol);
            }
        }
        symbols
    }

    pub fn add(&self, request: &CreateAlertRequest) -> Result<Mutation<PriceAlert>, AppError> {
        let symbol = parse_symbol(&request.symbol)?;
        let alert = PriceAlert::new(&symbol, request.target_price, request.condition)?;
        self.alerts.insert(alert)
    }

    pub fn update(&self, id: Uuid, update: &UpdateAlertRequest) -> Result<Mutation<PriceAlert>, AppError> {
        self.alerts.update(&id, |alert| alert.apply_update(update))
    }

    pub fn toggle(&self, id: Uuid) -> Result<Mutation<PriceAlert>, AppError> {
        self.alerts.update(&id, |alert| {
            alert.toggle();
            Ok(())
        })
    }

    pub fn remove(&self, id: Uuid) -> Result<Mutation<PriceAlert>, AppError> {
        self.alerts.remove(&id)
    }

    /// Flip every armed alert on `symbol` whose condition `price` satisfies, in one
    /// locked step. Returns the alerts that fired.
    pub fn fire_matching(&self, symbol: &str, price: f64) -> Vec<PriceAlert> {
        self.alerts.update_where(
            |alert| alert.symbol == symbol,
            |alert| {
                if alert.is_triggered_by(price) {
                    alert.fire();
                    true
                } else {
                    false
                }
            },
        )
    }

    pub fn replace_from_remote(&self, remote: Vec<PriceAlert>) {
        self.alerts.replace_all(remote);
    }
}
