//! Execution domain - paired long/short order placement

mod paired_executor;

pub use paired_executor::PairedExecutor;

use tokio::task::{JoinError, JoinHandle};

use crate::shared::errors::LegError;
use crate::shared::types::{OrderAck, Side, TradingPair, VenueId};

/// Sizing and price protection applied to every leg
#[derive(Debug, Clone, PartialEq)]
pub struct ExecutionSettings {
    pub trade_size: f64,
    pub slippage_buffer: f64,
}

impl Default for ExecutionSettings {
    fn default() -> Self {
        Self {
            trade_size: 0.01,
            slippage_buffer: 0.01,
        }
    }
}

/// Accepted order of a successful leg
#[derive(Debug, Clone, PartialEq)]
pub struct LegFill {
    pub limit_price: f64,
    pub ack: OrderAck,
}

/// Final outcome of one leg, delivered to observers when the leg finishes
#[derive(Debug, Clone, PartialEq)]
pub struct LegReport {
    pub venue: VenueId,
    pub pair: TradingPair,
    pub side: Side,
    pub outcome: Result<LegFill, LegError>,
}

impl LegReport {
    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Handles to the two independently running legs of one arbitrage.
///
/// Dropping it detaches both tasks; they keep running to completion.
#[derive(Debug)]
pub struct PairedDispatch {
    pub long: JoinHandle<LegReport>,
    pub short: JoinHandle<LegReport>,
}

impl PairedDispatch {
    /// Waits for both legs. Only used where an owner wants the outcomes.
    pub async fn join(self) -> (Result<LegReport, JoinError>, Result<LegReport, JoinError>) {
        tokio::join!(self.long, self.short)
    }
}
