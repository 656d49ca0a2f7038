use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::AppError;

// ==============================================================================
// Price Alert Models
// ==============================================================================

/// One-shot price threshold.
///
/// `active -> inactive` happens automatically the first time the condition holds.
/// Going back to active is a manual toggle only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceAlert {
    pub id: Uuid,
    pub symbol: String,
    pub target_price: f64,
    pub condition: AlertCondition,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub triggered_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub symbol: String,
    pub target_price: f64,
    pub condition: AlertCondition,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    pub target_price: Option<f64>,
    pub condition: Option<AlertCondition>,
}

// ==============================================================================
// Alert Enums
// ==============================================================================

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AlertCondition {
    Above,
    Below,
}

impl AlertCondition {
    pub fn is_met(&self, price: f64, target: f64) -> bool {
        match self {
            AlertCondition::Above => price >= target,
            AlertCondition::Below => price <= target,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCondition::Above => "above",
            AlertCondition::Below => "below",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "above" => Some(AlertCondition::Above),
            "below" => Some(AlertCondition::Below),
            _ => None,
        }
    }
}

impl std::fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl PriceAlert {
    pub fn new(symbol: &str, target_price: f64, condition: AlertCondition) -> Result<Self, AppError> {
        validate_target(target_price)?;
        Ok(Self {
            id: Uuid::new_v4(),
            symbol: symbol.to_string(),
            target_price,
            condition,
            active: true,
            created_at: Utc::now(),
            triggered_at: None,
        })
    }

    pub fn is_triggered_by(&self, price: f64) -> bool {
        self.active && self.condition.is_met(price, self.target_price)
    }

    pub fn apply_update(&mut self, update: &UpdateAlertRequest) -> Result<(), AppError> {
        if let Some(target) = update.target_price {
            validate_target(target)?;
            self.target_price = target;
        }
        if let Some(condition) = update.condition {
            self.condition = condition;
        }
        Ok(())
    }

    pub(crate) fn fire(&mut self) {
        self.active = false;
        self.triggered_at = Some(Utc::now());
    }

    /// Manual re-arm or disarm.
    pub(crate) fn toggle(&mut self) {
        self.active = !self.active;
        if self.active {
            self.triggered_at = None;
        }
    }
}

fn validate_target(target: f64) -> Result<(), AppError> {
    if !target.is_finite() || target <= 0.0 {
        return Err(AppError::Validation(format!(
            "target price must be greater than 0, got {}",
            target
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_boundaries_are_inclusive() {
        assert!(AlertCondition::Above.is_met(100.0, 100.0));
        assert!(!AlertCondition::Above.is_met(99.99, 100.0));
        assert!(AlertCondition::Below.is_met(50.0, 50.0));
        assert!(!AlertCondition::Below.is_met(50.01, 50.0));
    }

    #[test]
    fn test_inactive_alert_never_triggers() {
        let mut alert = PriceAlert::new("TSLA", 200.0, AlertCondition::Below).unwrap();
        assert!(alert.is_triggered_by(150.0));

        alert.fire();
        assert!(!alert.active);
        assert!(alert.triggered_at.is_some());
        assert!(!alert.is_triggered_by(150.0));

        alert.toggle();
        assert!(alert.active);
        assert!(alert.triggered_at.is_none());
    }

    #[test]
    fn test_condition_round_trips_through_str() {
        assert_eq!(AlertCondition::from_str("above"), Some(AlertCondition::Above));
        assert_eq!(AlertCondition::from_str(AlertCondition::Below.as_str()), Some(AlertCondition::Below));
        assert_eq!(AlertCondition::from_str("sideways"), None);
    }
}
