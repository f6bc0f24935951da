//! Fundarb - cross-venue perpetual funding rate arbitrage
//! Built with Domain-Driven Design principles

pub mod app;
pub mod application;
pub mod config;
pub mod domain;
pub mod exchanges;
pub mod infrastructure;
pub mod shared;

// Re-export main types for convenience
pub use domain::arbitrage::{ArbitrageEngine, Opportunity, OpportunityScanner};
pub use domain::execution::PairedExecutor;
pub use domain::farming::VolumeFarmer;
pub use domain::venue::{VenueAdapter, VenueRegistry};
