//! Lighter adapter - funding rates and market indices from the public REST API

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::http_client;
use crate::config::LighterCfg;
use crate::domain::venue::VenueAdapter;
use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, Position, TradingPair};

const VENUE: &str = "lighter";

#[derive(Debug, Deserialize)]
struct FundingRatesResponse {
    code: i64,
    #[serde(default)]
    funding_rates: Vec<FundingRateEntry>,
}

#[derive(Debug, Deserialize)]
struct FundingRateEntry {
    market_id: u16,
    symbol: String,
    rate: f64,
}

impl FundingRatesResponse {
    fn entry(&self, coin: &str) -> Result<&FundingRateEntry, VenueError> {
        if self.code != 200 {
            return Err(VenueError::Protocol(format!("API error code: {}", self.code)));
        }
        self.funding_rates
            .iter()
            .find(|entry| entry.symbol.eq_ignore_ascii_case(coin))
            .ok_or_else(|| VenueError::DataUnavailable(format!("funding rate not found for symbol: {}", coin)))
    }

    fn rate_for(&self, coin: &str) -> Result<f64, VenueError> {
        self.entry(coin).map(|entry| entry.rate)
    }

    fn market_index(&self, coin: &str) -> Result<u16, VenueError> {
        self.entry(coin)
            .map(|entry| entry.market_id)
            .map_err(|e| match e {
                VenueError::DataUnavailable(_) => VenueError::DataUnavailable(format!("unknown market: {}", coin)),
                other => other,
            })
    }
}

/// `ETH-USD` -> `ETH`, `ETHUSDT` -> `ETH`
pub fn normalize_symbol(symbol: &TradingPair) -> &str {
    let base = symbol.base_asset();
    base.strip_suffix("USDT").unwrap_or(base)
}

pub struct LighterClient {
    http: Client,
    base_url: String,
    has_signer: bool,
}

impl LighterClient {
    pub fn new(cfg: &LighterCfg) -> Result<Self, VenueError> {
        Ok(Self {
            http: http_client()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            has_signer: !cfg.private_key.is_empty() && !cfg.api_key.is_empty(),
        })
    }

    fn require_signer(&self) -> Result<(), VenueError> {
        if self.has_signer {
            Ok(())
        } else {
            Err(VenueError::Unauthenticated(
                "tx client not initialized - check private_key and api_key configuration".into(),
            ))
        }
    }

    async fn funding_rates(&self) -> Result<FundingRatesResponse, VenueError> {
        let url = format!("{}/api/v1/funding-rates", self.base_url);
        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(VenueError::Protocol(format!(
                "Lighter funding request failed with status: {}",
                response.status()
            )));
        }
        Ok(response.json::<FundingRatesResponse>().await?)
    }

    /// Order book index Lighter addresses the market by.
    pub async fn market_index(&self, symbol: &TradingPair) -> Result<u16, VenueError> {
        self.funding_rates().await?.market_index(normalize_symbol(symbol))
    }
}

#[async_trait]
impl VenueAdapter for LighterClient {
    async fn funding_rate(&self, symbol: &TradingPair) -> Result<f64, VenueError> {
        self.funding_rates().await?.rate_for(normalize_symbol(symbol))
    }

    async fn price(&self, _symbol: &TradingPair) -> Result<f64, VenueError> {
        Err(VenueError::unsupported(VENUE, "price"))
    }

    async fn balance(&self, _asset: &str) -> Result<f64, VenueError> {
        Err(VenueError::unsupported(VENUE, "balance"))
    }

    async fn position(&self, _symbol: &TradingPair) -> Result<Option<Position>, VenueError> {
        Err(VenueError::unsupported(VENUE, "position"))
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, VenueError> {
        self.require_signer()?;
        let market = self.market_index(&intent.symbol).await?;
        debug!("Lighter {} resolves to market index {}", intent.symbol, market);
        // TODO: submit to /api/v1/orders once create-order txs can be signed with the Lighter API key.
        Err(VenueError::unsupported(VENUE, "place_order"))
    }

    async fn cancel_order(&self, _symbol: &TradingPair, _order_id: &str) -> Result<(), VenueError> {
        self.require_signer()?;
        Err(VenueError::unsupported(VENUE, "cancel_order"))
    }
}
