//! EdgeX adapter - contract metadata and funding data from the public REST API

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::{info, warn};

use super::http_client;
use crate::config::EdgeXCfg;
use crate::domain::venue::VenueAdapter;
use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, Position, TradingPair};

const VENUE: &str = "edgex";
const METADATA_ATTEMPTS: u32 = 3;
const METADATA_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Every EdgeX response is wrapped in this envelope.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: String,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    msg: Option<String>,
}

impl Envelope {
    fn into_data<T: DeserializeOwned>(self) -> Result<T, VenueError> {
        if self.code != "SUCCESS" {
            let detail = self.msg.map(|m| format!(" ({})", m)).unwrap_or_default();
            return Err(VenueError::Protocol(format!("API error: {}{}", self.code, detail)));
        }
        Ok(serde_json::from_value(self.data)?)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Metadata {
    #[serde(rename = "contractList", default)]
    pub contract_list: Vec<Contract>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Contract {
    #[serde(rename = "contractId")]
    pub contract_id: String,
    #[serde(rename = "contractName")]
    pub contract_name: String,
}

#[derive(Debug, Deserialize)]
struct FundingRateData {
    #[serde(rename = "fundingRate")]
    funding_rate: String,
    #[serde(rename = "indexPrice")]
    index_price: String,
}

/// `ETH-USD` -> `ETHUSD`, `BTC-USDT` -> `BTCUSD`
pub fn normalize_symbol(symbol: &str) -> String {
    let joined = symbol.replace('-', "");
    match joined.strip_suffix('T') {
        Some(trimmed) => trimmed.to_string(),
        None => joined,
    }
}

pub struct EdgeXClient {
    http: Client,
    base_url: String,
    metadata: Option<Metadata>,
    has_credentials: bool,
}

impl EdgeXClient {
    /// Builds the client and loads contract metadata, retrying a few times.
    ///
    /// If every attempt fails the client is still returned; symbol lookups
    /// then fail with `DataUnavailable`.
    pub async fn connect(cfg: &EdgeXCfg) -> Result<Self, VenueError> {
        let mut client = Self::with_metadata(cfg, None)?;

        for attempt in 1..=METADATA_ATTEMPTS {
            match client.fetch_metadata().await {
                Ok(metadata) => {
                    info!("✅ EdgeX metadata loaded ({} contracts)", metadata.contract_list.len());
                    client.metadata = Some(metadata);
                    break;
                }
                Err(e) => {
                    warn!(
                        "⚠️ Failed to fetch EdgeX metadata (attempt {}/{}): {}",
                        attempt, METADATA_ATTEMPTS, e
                    );
                    if attempt < METADATA_ATTEMPTS {
                        tokio::time::sleep(METADATA_RETRY_DELAY).await;
                    }
                }
            }
        }

        Ok(client)
    }

    pub fn with_metadata(cfg: &EdgeXCfg, metadata: Option<Metadata>) -> Result<Self, VenueError> {
        Ok(Self {
            http: http_client()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            metadata,
            has_credentials: !cfg.api_key.is_empty() && !cfg.secret_key.is_empty(),
        })
    }

    pub fn metadata_loaded(&self) -> bool {
        self.metadata.is_some()
    }

    async fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T, VenueError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self.http.get(&url).query(query).send().await?;
        if !response.status().is_success() {
            return Err(VenueError::Protocol(format!(
                "EdgeX request {} failed with status: {}",
                path,
                response.status()
            )));
        }
        response.json::<Envelope>().await?.into_data()
    }

    async fn fetch_metadata(&self) -> Result<Metadata, VenueError> {
        self.get("/api/v1/public/meta/getMetaData", &[]).await
    }

    fn contract_id(&self, symbol: &TradingPair) -> Result<&str, VenueError> {
        let metadata = self
            .metadata
            .as_ref()
            .ok_or_else(|| VenueError::DataUnavailable("metadata not loaded".into()))?;
        let name = normalize_symbol(symbol.as_str());
        metadata
            .contract_list
            .iter()
            .find(|c| c.contract_name == name)
            .map(|c| c.contract_id.as_str())
            .ok_or_else(|| {
                VenueError::DataUnavailable(format!("contract not found for symbol: {} (normalized: {})", symbol, name))
            })
    }

    async fn latest_funding(&self, symbol: &TradingPair) -> Result<FundingRateData, VenueError> {
        let contract_id = self.contract_id(symbol)?;
        let data: Vec<FundingRateData> = self
            .get(
                "/api/v1/public/funding/getLatestFundingRate",
                &[("contractId", contract_id)],
            )
            .await?;
        data.into_iter()
            .next()
            .ok_or_else(|| VenueError::DataUnavailable("no funding data returned".into()))
    }

    fn account_error(&self, operation: &'static str) -> VenueError {
        if !self.has_credentials {
            return VenueError::Unauthenticated(format!("{} requires api_key and secret_key", operation));
        }
        VenueError::unsupported(VENUE, operation)
    }
}

#[async_trait]
impl VenueAdapter for EdgeXClient {
    async fn funding_rate(&self, symbol: &TradingPair) -> Result<f64, VenueError> {
        Ok(self.latest_funding(symbol).await?.funding_rate.parse::<f64>()?)
    }

    async fn price(&self, symbol: &TradingPair) -> Result<f64, VenueError> {
        Ok(self.latest_funding(symbol).await?.index_price.parse::<f64>()?)
    }

    async fn balance(&self, _asset: &str) -> Result<f64, VenueError> {
        Err(self.account_error("balance"))
    }

    async fn position(&self, _symbol: &TradingPair) -> Result<Option<Position>, VenueError> {
        Err(self.account_error("position"))
    }

    async fn place_order(&self, _intent: &OrderIntent) -> Result<OrderAck, VenueError> {
        Err(self.account_error("place_order"))
    }

    async fn cancel_order(&self, _symbol: &TradingPair, _order_id: &str) -> Result<(), VenueError> {
        Err(self.account_error("cancel_order"))
    }
}
