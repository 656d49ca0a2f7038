use std::collections::BTreeMap;

use crate::models::{AllocationBreach, AllocationLimits, AllocationReport, Position, SymbolWeight};

/// Weights of market value per symbol plus any limit breaches.
///
/// Positions without a live price are listed in `unpriced` and left out of the weights.
pub fn analyze_allocation(positions: &[Position], limits: &AllocationLimits) -> AllocationReport {
    let mut by_symbol: BTreeMap<&str, f64> = BTreeMap::new();
    let mut unpriced: Vec<String> = Vec::new();

    for position in positions {
        if position.has_price() {
            *by_symbol.entry(position.symbol.as_str()).or_insert(0.0) += position.market_value();
        } else if !unpriced.contains(&position.symbol) {
            unpriced.push(position.symbol.clone());
        }
    }

    let total_market_value: f64 = by_symbol.values().sum();
    if total_market_value <= 0.0 {
        return AllocationReport {
            unpriced,
            ..AllocationReport::default()
        };
    }

    let mut weights: Vec<SymbolWeight> = by_symbol
        .into_iter()
        .map(|(symbol, market_value)| SymbolWeight {
            symbol: symbol.to_string(),
            market_value,
            weight_pct: market_value / total_market_value * 100.0,
        })
        .collect();
    weights.sort_by(|a, b| b.weight_pct.total_cmp(&a.weight_pct));

    let mut breaches: Vec<AllocationBreach> = weights
        .iter()
        .filter(|w| w.weight_pct > limits.max_position_pct)
        .map(|w| AllocationBreach::Overweight {
            symbol: w.symbol.clone(),
            weight_pct: w.weight_pct,
            limit_pct: limits.max_position_pct,
            trim_amount: w.market_value - total_market_value * limits.max_position_pct / 100.0,
        })
        .collect();

    if weights.len() < limits.min_positions {
        breaches.push(AllocationBreach::UnderDiversified {
            holdings: weights.len(),
            minimum: limits.min_positions,
        });
    }

    AllocationReport {
        total_market_value,
        weights,
        breaches,
        unpriced,
    }
}
