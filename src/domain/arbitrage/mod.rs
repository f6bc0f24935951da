//! Arbitrage domain - funding rate scanning and the periodic engine loop

pub mod arbitrage_engine;
pub mod opportunity_scanner;

pub use arbitrage_engine::{ArbitrageEngine, EngineStats, FundingArbSettings, TickReport};
pub use opportunity_scanner::{select_opportunity, OpportunityScanner, RateSnapshot};

use chrono::{DateTime, Utc};

use crate::shared::types::{TradingPair, VenueId};

/// Cross-venue funding spread found in one tick. Not retained afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct Opportunity {
    pub id: String,
    pub pair: TradingPair,
    /// Venue paying the lowest funding rate; the long leg goes here.
    pub long_venue: VenueId,
    pub long_rate: f64,
    /// Venue paying the highest funding rate; the short leg goes here.
    pub short_venue: VenueId,
    pub short_rate: f64,
    pub spread: f64,
    pub detected_at: DateTime<Utc>,
}
