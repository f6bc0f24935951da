//! Domain layer - core business logic and entities

pub mod arbitrage;
pub mod execution;
pub mod farming;
pub mod venue;

/// Lifecycle of a long-running strategy loop. There is no paused state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Idle,
    Running,
    Stopped,
}
