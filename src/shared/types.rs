//! Common types used across the application

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Instrument identifier as configured, e.g. `ETH-USD`.
///
/// No canonical form is enforced; each venue adapter maps it to its own
/// symbol format.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TradingPair(String);

impl TradingPair {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the first `-`, or the whole symbol when there is none.
    pub fn base_asset(&self) -> &str {
        self.0.split('-').next().unwrap_or(&self.0)
    }
}

impl fmt::Display for TradingPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TradingPair {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TradingPair {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Registry key of an execution venue. Ordered lexically.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VenueId(String);

impl VenueId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VenueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for VenueId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for VenueId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "buy",
            Side::Sell => "sell",
        }
    }

    pub fn is_buy(&self) -> bool {
        matches!(self, Side::Buy)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Limit,
    Market,
}

/// Order handed to a venue adapter. Built fresh for every leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderIntent {
    pub symbol: TradingPair,
    pub side: Side,
    pub size: f64,
    pub limit_price: f64,
    pub order_type: OrderType,
    pub reduce_only: bool,
}

impl OrderIntent {
    pub fn limit(symbol: TradingPair, side: Side, size: f64, limit_price: f64) -> Self {
        Self {
            symbol,
            side,
            size,
            limit_price,
            order_type: OrderType::Limit,
            reduce_only: false,
        }
    }

    pub fn reduce_only(mut self) -> Self {
        self.reduce_only = true;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Open,
    Filled,
    Submitted,
    Unknown,
}

impl fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OrderStatus::Open => "open",
            OrderStatus::Filled => "filled",
            OrderStatus::Submitted => "submitted",
            OrderStatus::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// Venue acknowledgment of a placed order. Nothing past this is tracked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderAck {
    pub order_id: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub symbol: TradingPair,
    pub size: f64,
    pub entry_price: f64,
    pub unrealized_pnl: f64,
}

/// One successful funding-rate observation.
#[derive(Debug, Clone, PartialEq)]
pub struct RateQuote {
    pub venue: VenueId,
    pub pair: TradingPair,
    pub rate: f64,
    pub observed_at: DateTime<Utc>,
}

impl RateQuote {
    pub fn now(venue: VenueId, pair: TradingPair, rate: f64) -> Self {
        Self {
            venue,
            pair,
            rate,
            observed_at: Utc::now(),
        }
    }
}
