//! Hyperliquid adapter - market data from the info endpoint, orders through the exchange API

use async_trait::async_trait;
use ethers::signers::{LocalWallet, Signer};
use hyperliquid_rust_sdk::{
    BaseUrl, ClientCancelRequest, ClientLimit, ClientOrder, ClientOrderRequest, ExchangeClient, ExchangeDataStatus,
    ExchangeResponseStatus,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::OnceCell;
use tracing::{debug, info, warn};

use super::http_client;
use crate::config::HyperliquidCfg;
use crate::domain::venue::VenueAdapter;
use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, OrderStatus, OrderType, Position, TradingPair};

const VENUE: &str = "hyperliquid";

#[derive(Debug, Serialize)]
struct InfoRequest {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct Meta {
    universe: Vec<UniverseAsset>,
}

#[derive(Debug, Deserialize)]
struct UniverseAsset {
    name: String,
}

#[derive(Debug, Deserialize)]
struct AssetCtx {
    funding: String,
    #[serde(rename = "midPx")]
    mid_px: Option<String>,
}

/// `metaAndAssetCtxs` answers with a two-element array.
#[derive(Debug, Deserialize)]
struct MetaAndAssetCtxs(Meta, Vec<AssetCtx>);

impl MetaAndAssetCtxs {
    fn ctx(&self, coin: &str) -> Result<&AssetCtx, VenueError> {
        let index = self
            .0
            .universe
            .iter()
            .position(|asset| asset.name == coin)
            .ok_or_else(|| VenueError::DataUnavailable(format!("symbol {} not found in universe", coin)))?;
        self.1
            .get(index)
            .ok_or_else(|| VenueError::DataUnavailable(format!("asset context not found for index {}", index)))
    }
}

/// `ETH-USD` -> `ETH`
pub fn normalize_symbol(symbol: &TradingPair) -> &str {
    symbol.base_asset()
}

fn sdk_base_url(url: &str) -> BaseUrl {
    if url.contains("testnet") {
        BaseUrl::Testnet
    } else if url.contains("localhost") || url.contains("127.0.0.1") {
        BaseUrl::Localhost
    } else {
        BaseUrl::Mainnet
    }
}

/// Market orders go out as IOC limits at the protective price.
fn order_request(intent: &OrderIntent) -> ClientOrderRequest {
    let tif = match intent.order_type {
        OrderType::Limit => "Gtc",
        OrderType::Market => "Ioc",
    };
    ClientOrderRequest {
        asset: normalize_symbol(&intent.symbol).to_string(),
        is_buy: intent.side.is_buy(),
        reduce_only: intent.reduce_only,
        limit_px: intent.limit_price,
        sz: intent.size,
        cloid: None,
        order_type: ClientOrder::Limit(ClientLimit { tif: tif.to_string() }),
    }
}

fn first_status(response: ExchangeResponseStatus) -> Result<ExchangeDataStatus, VenueError> {
    let response = match response {
        ExchangeResponseStatus::Ok(response) => response,
        ExchangeResponseStatus::Err(message) => {
            return Err(VenueError::Protocol(format!("exchange rejected request: {}", message)))
        }
    };
    response
        .data
        .and_then(|data| data.statuses.into_iter().next())
        .ok_or_else(|| VenueError::Protocol("exchange response carried no status".into()))
}

/// Resting orders are open, filled orders carry their oid too.
fn order_ack(response: ExchangeResponseStatus) -> Result<OrderAck, VenueError> {
    match first_status(response)? {
        ExchangeDataStatus::Resting(order) => Ok(OrderAck {
            order_id: order.oid.to_string(),
            status: OrderStatus::Open,
        }),
        ExchangeDataStatus::Filled(order) => Ok(OrderAck {
            order_id: order.oid.to_string(),
            status: OrderStatus::Filled,
        }),
        ExchangeDataStatus::Error(message) => Err(VenueError::Protocol(format!("order failed: {}", message))),
        other => {
            debug!("Hyperliquid order status without oid: {:?}", other);
            Ok(OrderAck {
                order_id: String::new(),
                status: OrderStatus::Unknown,
            })
        }
    }
}

fn cancel_ack(response: ExchangeResponseStatus) -> Result<(), VenueError> {
    match first_status(response)? {
        ExchangeDataStatus::Error(message) => Err(VenueError::Protocol(format!("cancel failed: {}", message))),
        _ => Ok(()),
    }
}

fn parse_wallet(cfg: &HyperliquidCfg) -> Option<LocalWallet> {
    if cfg.private_key.is_empty() {
        return None;
    }
    let wallet = match cfg.private_key.parse::<LocalWallet>() {
        Ok(wallet) => wallet,
        Err(e) => {
            warn!("Hyperliquid private key rejected, trading disabled: {}", e);
            return None;
        }
    };
    let derived = format!("{:?}", wallet.address());
    if !cfg.wallet_address.is_empty() && !cfg.wallet_address.eq_ignore_ascii_case(&derived) {
        warn!(
            "Hyperliquid wallet_address {} does not match key address {}",
            cfg.wallet_address, derived
        );
    }
    Some(wallet)
}

pub struct HyperliquidClient {
    http: Client,
    base_url: String,
    wallet: Option<LocalWallet>,
    exchange: OnceCell<ExchangeClient>,
}

impl HyperliquidClient {
    pub fn new(cfg: &HyperliquidCfg) -> Result<Self, VenueError> {
        Ok(Self {
            http: http_client()?,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            wallet: parse_wallet(cfg),
            exchange: OnceCell::new(),
        })
    }

    /// Address trading is signed for, when a usable key is configured.
    pub fn wallet_address(&self) -> Option<String> {
        self.wallet.as_ref().map(|w| format!("{:?}", w.address()))
    }

    async fn meta_and_asset_ctxs(&self) -> Result<MetaAndAssetCtxs, VenueError> {
        let url = format!("{}/info", self.base_url);
        let response = self
            .http
            .post(&url)
            .json(&InfoRequest {
                kind: "metaAndAssetCtxs",
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(VenueError::Protocol(format!(
                "Hyperliquid info request failed with status: {}",
                response.status()
            )));
        }
        Ok(response.json::<MetaAndAssetCtxs>().await?)
    }

    /// The exchange client loads asset metadata on creation, so it is built on first use.
    async fn exchange(&self) -> Result<&ExchangeClient, VenueError> {
        let wallet = self.wallet.as_ref().ok_or_else(|| {
            VenueError::Unauthenticated("exchange client not initialized (check private key)".into())
        })?;
        self.exchange
            .get_or_try_init(|| async {
                let client = ExchangeClient::new(None, wallet.clone(), Some(sdk_base_url(&self.base_url)), None, None)
                    .await
                    .map_err(|e| VenueError::Unreachable(format!("Hyperliquid exchange client: {}", e)))?;
                info!("🔑 Hyperliquid exchange client ready for {:?}", wallet.address());
                Ok(client)
            })
            .await
    }
}

#[async_trait]
impl VenueAdapter for HyperliquidClient {
    async fn funding_rate(&self, symbol: &TradingPair) -> Result<f64, VenueError> {
        let coin = normalize_symbol(symbol);
        let state = self.meta_and_asset_ctxs().await?;
        let rate = state.ctx(coin)?.funding.parse::<f64>()?;
        debug!("Hyperliquid funding for {}: {}", coin, rate);
        Ok(rate)
    }

    async fn price(&self, symbol: &TradingPair) -> Result<f64, VenueError> {
        let coin = normalize_symbol(symbol);
        let state = self.meta_and_asset_ctxs().await?;
        let mid = state
            .ctx(coin)?
            .mid_px
            .as_deref()
            .ok_or_else(|| VenueError::DataUnavailable(format!("no mid price for {}", coin)))?;
        Ok(mid.parse::<f64>()?)
    }

    async fn balance(&self, _asset: &str) -> Result<f64, VenueError> {
        Err(VenueError::unsupported(VENUE, "balance"))
    }

    async fn position(&self, _symbol: &TradingPair) -> Result<Option<Position>, VenueError> {
        Err(VenueError::unsupported(VENUE, "position"))
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, VenueError> {
        let exchange = self.exchange().await?;
        let response = exchange
            .order(order_request(intent), None)
            .await
            .map_err(|e| VenueError::Protocol(format!("order request failed: {}", e)))?;
        let ack = order_ack(response)?;
        debug!(
            "Hyperliquid {} {} {} @ {} -> {} ({})",
            intent.side, intent.size, intent.symbol, intent.limit_price, ack.status, ack.order_id
        );
        Ok(ack)
    }

    async fn cancel_order(&self, symbol: &TradingPair, order_id: &str) -> Result<(), VenueError> {
        let oid = order_id
            .parse::<u64>()
            .map_err(|_| VenueError::Protocol(format!("invalid Hyperliquid order id: {}", order_id)))?;
        let exchange = self.exchange().await?;
        let request = ClientCancelRequest {
            asset: normalize_symbol(symbol).to_string(),
            oid,
        };
        let response = exchange
            .cancel(request, None)
            .await
            .map_err(|e| VenueError::Protocol(format!("cancel request failed: {}", e)))?;
        cancel_ack(response)
    }
}
