//! Venue domain - execution venue contract and registry

mod venue_registry;

#[cfg(test)]
pub(crate) mod mock;

pub use venue_registry::{VenueRegistry, VenueRegistryBuilder};

use async_trait::async_trait;

use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, Position, TradingPair};

/// Common interface for all venue implementations.
///
/// Calls may block on network I/O and must be safe to issue concurrently:
/// the scanner and both legs of a paired execution can hit the same adapter
/// at once. Capabilities a venue does not offer return
/// [`VenueError::Unsupported`].
#[async_trait]
pub trait VenueAdapter: Send + Sync {
    async fn funding_rate(&self, symbol: &TradingPair) -> Result<f64, VenueError>;

    async fn price(&self, symbol: &TradingPair) -> Result<f64, VenueError>;

    async fn balance(&self, asset: &str) -> Result<f64, VenueError>;

    async fn position(&self, symbol: &TradingPair) -> Result<Option<Position>, VenueError>;

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, VenueError>;

    async fn cancel_order(&self, symbol: &TradingPair, order_id: &str) -> Result<(), VenueError>;
}
