//! Farming domain - randomized wash trades for venue volume programs

mod volume_farmer;

pub use volume_farmer::{sample_interval, VolumeFarmer};

use std::time::Duration;

use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, TradingPair, VenueId};

#[derive(Debug, Clone, PartialEq)]
pub struct FarmingSettings {
    pub venue: VenueId,
    pub symbol: TradingPair,
    pub trade_size: f64,
    pub max_slippage: f64,
    pub min_interval: Duration,
    pub max_interval: Duration,
    /// Pause between the buy and the closing sell.
    pub settle_delay: Duration,
    /// Informational only. The cadence does not react to it.
    pub target_volume_daily: f64,
}

impl Default for FarmingSettings {
    fn default() -> Self {
        Self {
            venue: "hyperliquid".into(),
            symbol: "ETH".into(),
            trade_size: 0.01,
            max_slippage: 0.001,
            min_interval: Duration::from_secs(30),
            max_interval: Duration::from_secs(120),
            settle_delay: Duration::from_secs(2),
            target_volume_daily: 0.0,
        }
    }
}

/// Outcome of one buy-then-sell round
#[derive(Debug, Clone, PartialEq)]
pub struct FarmingRound {
    pub price: f64,
    pub buy: Result<OrderAck, VenueError>,
    pub sell: Result<OrderAck, VenueError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FarmingStats {
    pub rounds: u64,
    pub buys_placed: u64,
    pub sells_placed: u64,
    pub failures: u64,
    /// Sum of price * size over accepted orders.
    pub submitted_notional: f64,
}
