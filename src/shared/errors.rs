//! Error handling for the application

use thiserror::Error;

use crate::shared::types::VenueId;

/// Classified failure returned by every venue adapter call
#[derive(Error, Debug, Clone, PartialEq)]
pub enum VenueError {
    #[error("Venue unreachable: {0}")]
    Unreachable(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Data unavailable: {0}")]
    DataUnavailable(String),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("{operation} is not supported by {venue}")]
    Unsupported {
        venue: String,
        operation: &'static str,
    },
}

/// Coarse error class, for callers that branch on the kind of failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VenueErrorKind {
    Transport,
    DataUnavailable,
    Unauthenticated,
    Unsupported,
}

impl VenueError {
    pub fn unsupported(venue: impl Into<String>, operation: &'static str) -> Self {
        VenueError::Unsupported {
            venue: venue.into(),
            operation,
        }
    }

    pub fn kind(&self) -> VenueErrorKind {
        match self {
            VenueError::Unreachable(_) | VenueError::Protocol(_) => VenueErrorKind::Transport,
            VenueError::DataUnavailable(_) => VenueErrorKind::DataUnavailable,
            VenueError::Unauthenticated(_) => VenueErrorKind::Unauthenticated,
            VenueError::Unsupported { .. } => VenueErrorKind::Unsupported,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        self.kind() == VenueErrorKind::Unsupported
    }
}

impl From<reqwest::Error> for VenueError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            VenueError::Protocol(err.to_string())
        } else {
            VenueError::Unreachable(err.to_string())
        }
    }
}

impl From<serde_json::Error> for VenueError {
    fn from(err: serde_json::Error) -> Self {
        VenueError::Protocol(err.to_string())
    }
}

impl From<std::num::ParseFloatError> for VenueError {
    fn from(err: std::num::ParseFloatError) -> Self {
        VenueError::Protocol(format!("invalid number: {}", err))
    }
}

/// Failure of one arbitrage leg
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LegError {
    #[error("Venue not registered: {0}")]
    UnknownVenue(VenueId),

    #[error("Price fetch failed: {0}")]
    PriceFetch(VenueError),

    #[error("Order placement failed: {0}")]
    PlaceOrder(VenueError),
}

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Read(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Venue registry errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegistryError {
    #[error("Venue registered twice: {0}")]
    DuplicateVenue(VenueId),
}

/// Stream client errors
#[derive(Error, Debug)]
pub enum StreamError {
    #[error("WebSocket connection failed: {0}")]
    Connection(String),

    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("JSON encode error: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Connection timeout")]
    Timeout,

    #[error("WebSocket not connected")]
    NotConnected,
}

/// General application error
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Registry error: {0}")]
    Registry(#[from] RegistryError),

    #[error("Venue error: {0}")]
    Venue(#[from] VenueError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(VenueError::Unreachable("timeout".into()).kind(), VenueErrorKind::Transport);
        assert_eq!(VenueError::Protocol("code 500".into()).kind(), VenueErrorKind::Transport);
        assert_eq!(
            VenueError::DataUnavailable("no funding data".into()).kind(),
            VenueErrorKind::DataUnavailable
        );
        assert_eq!(
            VenueError::Unauthenticated("no key".into()).kind(),
            VenueErrorKind::Unauthenticated
        );
        assert!(VenueError::unsupported("lighter", "price").is_unsupported());
    }

    #[test]
    fn test_unsupported_message_names_capability() {
        let err = VenueError::unsupported("edgex", "cancel_order");
        assert_eq!(err.to_string(), "cancel_order is not supported by edgex");
    }
}
