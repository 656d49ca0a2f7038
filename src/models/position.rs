use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

// A user's holding of one symbol. Derived values are private so they can only change
// together with their inputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Position {
    pub id: Uuid,
    pub symbol: String,
    units: f64,
    avg_cost: f64,
    current_price: f64,
    purchase_value: f64,
    market_value: f64,
    profit_loss: f64,
    profit_loss_percent: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePosition {
    pub symbol: String,
    pub units: f64,
    pub avg_cost: f64,
    pub current_price: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePosition {
    pub units: Option<f64>,
    pub avg_cost: Option<f64>,
}

/// Totals across every position with a live price.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioSummary {
    pub position_count: usize,
    pub priced_count: usize,
    pub purchase_value: f64,
    pub market_value: f64,
    pub profit_loss: f64,
    pub profit_loss_percent: f64,
}

impl Position {
    pub fn new(
        symbol: &str,
        units: f64,
        avg_cost: f64,
        current_price: f64,
    ) -> Result<Self, AppError> {
        validate_units(units)?;
        validate_avg_cost(avg_cost)?;
        validate_price(current_price)?;

        let now = Utc::now();
        let mut position = Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            units,
            avg_cost,
            current_price,
            purchase_value: 0.0,
            market_value: 0.0,
            profit_loss: 0.0,
            profit_loss_percent: 0.0,
            created_at: now,
            updated_at: now,
        };
        position.recompute();
        Ok(position)
    }

    /// Rebuilds a position from stored inputs, e.g. a remote row.
    pub fn restore(
        id: Uuid,
        symbol: &str,
        units: f64,
        avg_cost: f64,
        current_price: f64,
        created_at: DateTime<Utc>,
    ) -> Self {
        let mut position = Self {
            id,
            symbol: symbol.to_string(),
            units,
            avg_cost,
            current_price,
            purchase_value: 0.0,
            market_value: 0.0,
            profit_loss: 0.0,
            profit_loss_percent: 0.0,
            created_at,
            updated_at: created_at,
        };
        position.recompute();
        position
    }

    pub fn units(&self) -> f64 {
        self.units
    }

    pub fn avg_cost(&self) -> f64 {
        self.avg_cost
    }

    pub fn current_price(&self) -> f64 {
        self.current_price
    }

    pub fn purchase_value(&self) -> f64 {
        self.purchase_value
    }

    pub fn market_value(&self) -> f64 {
        self.market_value
    }

    pub fn profit_loss(&self) -> f64 {
        self.profit_loss
    }

    pub fn profit_loss_percent(&self) -> f64 {
        self.profit_loss_percent
    }

    pub fn has_price(&self) -> bool {
        self.current_price > 0.0
    }

    pub fn apply_update(&mut self, update: &UpdatePosition) -> Result<(), AppError> {
        let units = update.units.unwrap_or(self.units);
        let avg_cost = update.avg_cost.unwrap_or(self.avg_cost);
        validate_units(units)?;
        validate_avg_cost(avg_cost)?;

        self.units = units;
        self.avg_cost = avg_cost;
        self.updated_at = Utc::now();
        self.recompute();
        Ok(())
    }

    pub fn set_price(&mut self, price: f64) -> Result<(), AppError> {
        validate_price(price)?;
        self.current_price = price;
        self.updated_at = Utc::now();
        self.recompute();
        Ok(())
    }

    /// All four derived values move together.
    pub(crate) fn recompute(&mut self) {
        self.purchase_value = self.units * self.avg_cost;
        self.market_value = self.units * self.current_price;
        self.profit_loss = self.market_value - self.purchase_value;
        self.profit_loss_percent = if self.purchase_value == 0.0 {
            0.0
        } else {
            self.profit_loss / self.purchase_value * 100.0
        };
    }
}

impl PortfolioSummary {
    pub fn from_positions(positions: &[Position]) -> Self {
        let mut summary = PortfolioSummary {
            position_count: positions.len(),
            ..Default::default()
        };

        // Unpriced positions would otherwise show up as a 100% loss.
        for position in positions.iter().filter(|p| p.has_price()) {
            summary.priced_count += 1;
            summary.purchase_value += position.purchase_value();
            summary.market_value += position.market_value();
        }

        summary.profit_loss = summary.market_value - summary.purchase_value;
        summary.profit_loss_percent = if summary.purchase_value == 0.0 {
            0.0
        } else {
            summary.profit_loss / summary.purchase_value * 100.0
        };
        summary
    }
}

fn validate_units(units: f64) -> Result<(), AppError> {
    if !units.is_finite() || units <= 0.0 {
        return Err(AppError::Validation(format!("units must be greater than 0, got {}", units)));
    }
    Ok(())
}

fn validate_avg_cost(avg_cost: f64) -> Result<(), AppError> {
    if !avg_cost.is_finite() || avg_cost <= 0.0 {
        return Err(AppError::Validation(format!(
            "average cost must be greater than 0, got {}",
            avg_cost
        )));
    }
    Ok(())
}

pub(crate) fn validate_price(price: f64) -> Result<(), AppError> {
    if !price.is_finite() || price < 0.0 {
        return Err(AppError::Validation(format!("price cannot be negative, got {}", price)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(position: &Position) {
        assert_eq!(position.market_value(), position.units() * position.current_price());
        assert_eq!(position.purchase_value(), position.units() * position.avg_cost());
        assert_eq!(
            position.profit_loss(),
            position.market_value() - position.purchase_value()
        );
    }

    #[test]
    fn test_new_position_derives_values() {
        let position = Position::new("AAPL", 10.0, 100.0, 110.0).unwrap();

        assert_eq!(position.purchase_value(), 1000.0);
        assert_eq!(position.market_value(), 1100.0);
        assert_eq!(position.profit_loss(), 100.0);
        assert!((position.profit_loss_percent() - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_rejects_non_positive_inputs() {
        assert!(Position::new("AAPL", 0.0, 100.0, 0.0).is_err());
        assert!(Position::new("AAPL", 5.0, -1.0, 0.0).is_err());
        assert!(Position::new("AAPL", 5.0, 10.0, -3.0).is_err());
    }

    #[test]
    fn test_every_mutation_keeps_derived_values_consistent() {
        let mut position = Position::new("MSFT", 4.0, 250.0, 0.0).unwrap();
        assert_consistent(&position);

        position.set_price(300.0).unwrap();
        assert_consistent(&position);

        position
            .apply_update(&UpdatePosition { units: Some(6.0), avg_cost: None })
            .unwrap();
        assert_consistent(&position);
        assert_eq!(position.market_value(), 1800.0);

        assert!(position
            .apply_update(&UpdatePosition { units: Some(0.0), avg_cost: None })
            .is_err());
        assert_eq!(position.units(), 6.0);
    }

    #[test]
    fn test_summary_skips_unpriced_positions() {
        let priced = Position::new("AAPL", 10.0, 100.0, 110.0).unwrap();
        let unpriced = Position::new("NEWCO", 5.0, 20.0, 0.0).unwrap();

        let summary = PortfolioSummary::from_positions(&[priced, unpriced]);

        assert_eq!(summary.position_count, 2);
        assert_eq!(summary.priced_count, 1);
        assert_eq!(summary.market_value, 1100.0);
        assert_eq!(summary.profit_loss, 100.0);
    }
}
