//! Venue adapters and the factory that assembles them into a registry

pub mod edgex;
pub mod hyperliquid;
pub mod lighter;

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tracing::info;

pub use edgex::EdgeXClient;
pub use hyperliquid::HyperliquidClient;
pub use lighter::LighterClient;

use crate::config::ExchangesCfg;
use crate::domain::venue::VenueRegistry;
use crate::shared::errors::{AppError, VenueError};

pub const HYPERLIQUID: &str = "hyperliquid";
pub const LIGHTER: &str = "lighter";
pub const EDGEX: &str = "edgex";

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Shared client for one adapter. Safe for concurrent requests.
pub(crate) fn http_client() -> Result<Client, VenueError> {
    Ok(Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Builds one adapter per enabled venue.
pub async fn build_registry(cfg: &ExchangesCfg) -> Result<VenueRegistry, AppError> {
    let mut builder = VenueRegistry::builder();

    if cfg.hyperliquid.enabled {
        builder = builder.register(HYPERLIQUID, Arc::new(HyperliquidClient::new(&cfg.hyperliquid)?));
        info!("🔗 Registered venue {} ({})", HYPERLIQUID, cfg.hyperliquid.base_url);
    }
    if cfg.lighter.enabled {
        builder = builder.register(LIGHTER, Arc::new(LighterClient::new(&cfg.lighter)?));
        info!("🔗 Registered venue {} ({})", LIGHTER, cfg.lighter.base_url);
    }
    if cfg.edgex.enabled {
        builder = builder.register(EDGEX, Arc::new(EdgeXClient::connect(&cfg.edgex).await?));
        info!("🔗 Registered venue {} ({})", EDGEX, cfg.edgex.base_url);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_venues_are_skipped() {
        let mut cfg = ExchangesCfg::default();
        cfg.lighter.enabled = false;
        cfg.edgex.enabled = false;

        let registry = build_registry(&cfg).await.unwrap();

        let names: Vec<&str> = registry.names().map(|v| v.as_str()).collect();
        assert_eq!(names, vec![HYPERLIQUID]);
    }

    #[tokio::test]
    async fn test_all_disabled_is_empty() {
        let mut cfg = ExchangesCfg::default();
        cfg.hyperliquid.enabled = false;
        cfg.lighter.enabled = false;
        cfg.edgex.enabled = false;

        assert!(build_registry(&cfg).await.unwrap().is_empty());
    }
}
