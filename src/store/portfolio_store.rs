use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::position::validate_price;
use crate::models::{CreatePosition, PortfolioSummary, Position, UpdatePosition};
use crate::store::collection::{PersistedCollection, Record};
use crate::store::mutation::Mutation;
use crate::store::storage::LocalStorage;
use crate::utils::parse_symbol;

impl Record for Position {
    type Key = Uuid;

    fn key(&self) -> Uuid {
        self.id
    }

    fn normalize(&mut self) {
        self.recompute();
    }

    // A rolled-back edit must not bring back a stale price.
    fn reconcile(&mut self, live: &Self) {
        let _ = self.set_price(live.current_price());
    }
}

pub struct PortfolioStore {
    positions: PersistedCollection<Position>,
}

impl PortfolioStore {
    pub fn new(storage: Arc<dyn LocalStorage>) -> Self {
        Self {
            positions: PersistedCollection::new("positions", storage),
        }
    }

    pub fn collection(&self) -> &PersistedCollection<Position> {
        &self.positions
    }

    pub fn hydrate(&self) -> Result<usize, AppError> {
        self.positions.hydrate()
    }

    pub fn positions(&self) -> Vec<Position> {
        self.positions.snapshot()
    }

    pub fn get(&self, id: Uuid) -> Option<Position> {
        self.positions.get(&id)
    }

    pub fn summary(&self) -> PortfolioSummary {
        PortfolioSummary::from_positions(&self.positions.snapshot())
    }

    /// Distinct symbols in insertion order.
    pub fn symbols(&self) -> Vec<String> {
        let mut symbols: Vec<String> = Vec::new();
        for position in self.positions.snapshot() {
            if !symbols.contains(&position.symbol) {
                symbols.push(position.symbol);
            }
        }
        symbols
    }

    /// New positions start at the price already known for the symbol unless one is given.
    pub fn add(&self, request: &CreatePosition) -> Result<Mutation<Position>, AppError> {
        let symbol = parse_symbol(&request.symbol)?;
        let price = match request.current_price {
            Some(price) => price,
            None => self.known_price(&symbol).unwrap_or(0.0),
        };
        let position = Position::new(&symbol, request.units, request.avg_cost, price)?;
        self.positions.insert(position)
    }

    pub fn update(&self, id: Uuid, update: &UpdatePosition) -> Result<Mutation<Position>, AppError> {
        self.positions.update(&id, |position| position.apply_update(update))
    }

    pub fn remove(&self, id: Uuid) -> Result<Mutation<Position>, AppError> {
        self.positions.remove(&id)
    }

    /// Push a fresh price into every position for `symbol`.
    ///
    /// Returns the positions that actually changed; unknown symbols, repeated prices
    /// and the unavailable price 0 change nothing.
    pub fn update_price(&self, symbol: &str, price: f64) -> Result<Vec<Position>, AppError> {
        validate_price(price)?;
        if price == 0.0 {
            return Ok(Vec::new());
        }
        let changed = self.positions.update_where(
            |position| position.symbol == symbol,
            |position| {
                if position.current_price() == price {
                    return false;
                }
                position.set_price(price).is_ok()
            },
        );
        if !changed.is_empty() {
            debug!("Updated {} position(s) for {} at {:.2}", changed.len(), symbol, price);
        }
        Ok(changed)
    }

    /// Replace every position with the remote set, carrying live prices over by symbol.
    pub fn replace_from_remote(&self, remote: Vec<Position>) {
        let live: HashMap<String, f64> = self
            .positions
            .snapshot()
            .into_iter()
            .filter(|p| p.has_price())
            .map(|p| (p.symbol.clone(), p.current_price()))
            .collect();

        let merged = remote
            .into_iter()
            .map(|mut position| {
                if let Some(price) = live.get(&position.symbol) {
                    let _ = position.set_price(*price);
                }
                position
            })
            .collect();
        self.positions.replace_all(merged);
    }

    fn known_price(&self, symbol: &str) -> Option<f64> {
        self.positions
            .snapshot()
            .into_iter()
            .find(|p| p.symbol == symbol && p.has_price())
            .map(|p| p.current_price())
    }
}
