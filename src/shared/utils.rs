//! Utility functions and helpers

use crate::shared::types::Side;

/// Protective limit price for an aggressive order: above the reference price
/// for buys, below it for sells.
pub fn protective_limit_price(price: f64, side: Side, buffer: f64) -> f64 {
    match side {
        Side::Buy => price * (1.0 + buffer),
        Side::Sell => price * (1.0 - buffer),
    }
}

/// Generate unique ID
pub fn generate_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Funding rates are tiny; print them with enough precision to compare.
pub fn format_rate(rate: f64) -> String {
    format!("{:.6}", rate)
}
