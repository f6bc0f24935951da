//! Infrastructure layer - external streaming connections

pub mod edgex_ws;

pub use edgex_ws::{EdgeXStreamClient, TickerContent, WsMessage};
