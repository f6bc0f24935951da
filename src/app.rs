use anyhow::{Context, Result};
use std::future::Future;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::config::Config;
use crate::domain::arbitrage::{select_opportunity, ArbitrageEngine, OpportunityScanner};
use crate::domain::execution::PairedExecutor;
use crate::domain::farming::VolumeFarmer;
use crate::domain::venue::VenueRegistry;
use crate::exchanges;
use crate::infrastructure::edgex_ws::{EdgeXStreamClient, TickerContent};
use crate::shared::types::TradingPair;
use crate::shared::utils::format_rate;

/// Long-running loops enabled by the configuration
pub struct Strategies {
    pub engine: Option<Arc<ArbitrageEngine>>,
    pub farmer: Option<Arc<VolumeFarmer>>,
}

impl Strategies {
    pub fn from_config(cfg: &Config, registry: Arc<VenueRegistry>) -> Self {
        let arb = &cfg.strategies.funding_arb;
        let engine = arb.enabled.then(|| {
            let executor = Arc::new(PairedExecutor::new(registry.clone(), arb.execution_settings()));
            Arc::new(ArbitrageEngine::new(arb.engine_settings(), registry.clone(), executor))
        });

        let farm = &cfg.strategies.xp_farming;
        let farmer = farm
            .enabled
            .then(|| Arc::new(VolumeFarmer::new(registry.clone(), farm.farming_settings())));

        Self { engine, farmer }
    }

    pub fn is_empty(&self) -> bool {
        self.engine.is_none() && self.farmer.is_none()
    }
}

/// Runs every enabled loop until `shutdown` resolves, then cancels and waits for them.
///
/// Legs already dispatched by the engine are not awaited.
pub async fn run_until<F>(strategies: &Strategies, shutdown: F) -> Result<()>
where
    F: Future<Output = ()>,
{
    let cancel = CancellationToken::new();
    let mut handles = Vec::new();

    if let Some(engine) = &strategies.engine {
        let engine = engine.clone();
        let token = cancel.clone();
        handles.push(tokio::spawn(async move { engine.run(token).await }));
    }
    if let Some(farmer) = &strategies.farmer {
        let farmer = farmer.clone();
        let token = cancel.clone();
        handles.push(tokio::spawn(async move { farmer.run(token).await }));
    }

    shutdown.await;
    info!("🛑 Shutdown requested, stopping strategies...");
    cancel.cancel();

    let mut first_failure = None;
    for result in futures::future::join_all(handles).await {
        if let Err(e) = result {
            error!("Strategy task failed: {}", e);
            first_failure.get_or_insert(e);
        }
    }

    if let Some(engine) = &strategies.engine {
        let stats = engine.stats().await;
        info!(
            "📊 Funding arb: {} ticks, {} pair scans, {} opportunities, {} dispatches",
            stats.ticks, stats.pairs_scanned, stats.opportunities, stats.dispatches
        );
    }
    if let Some(farmer) = &strategies.farmer {
        let stats = farmer.stats().await;
        info!(
            "📊 XP farming: {} rounds, {} buys, {} sells, {} failures, notional {:.2}",
            stats.rounds, stats.buys_placed, stats.sells_placed, stats.failures, stats.submitted_notional
        );
    }

    match first_failure {
        Some(e) => Err::<(), _>(e).context("strategy task panicked"),
        None => Ok(()),
    }
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {}", e);
    }
}

async fn build_registry(cfg: &Config) -> Result<Arc<VenueRegistry>> {
    let registry = exchanges::build_registry(&cfg.exchanges)
        .await
        .context("build venue registry")?;
    info!("Venues: {:?}", registry.names().collect::<Vec<_>>());
    Ok(Arc::new(registry))
}

pub async fn run(cfg: Config) -> Result<()> {
    info!("Starting funding arbitrage bot");

    let registry = build_registry(&cfg).await?;
    let strategies = Strategies::from_config(&cfg, registry);
    if strategies.is_empty() {
        warn!("No strategy enabled; set strategies.funding_arb.enabled or strategies.xp_farming.enabled");
        return Ok(());
    }

    run_until(&strategies, ctrl_c()).await
}

/// One pass over the pairs. Never places orders.
pub async fn scan(cfg: Config, pairs: Vec<String>) -> Result<()> {
    let registry = build_registry(&cfg).await?;
    let scanner = OpportunityScanner::new(registry);
    let arb = &cfg.strategies.funding_arb;

    let pairs: Vec<TradingPair> = if pairs.is_empty() {
        arb.pairs.iter().map(|p| p.as_str().into()).collect()
    } else {
        pairs.into_iter().map(TradingPair::from).collect()
    };

    for pair in &pairs {
        let snapshot = scanner.scan(pair).await;
        info!("🔍 {} ({} venues reported)", pair, snapshot.len());
        for (venue, rate) in &snapshot.rates {
            info!("   {:<12} {}", venue.as_str(), format_rate(*rate));
        }
        match select_opportunity(&snapshot) {
            Some(opp) => {
                let verdict = if opp.spread >= arb.min_funding_diff {
                    "✅ qualifies"
                } else {
                    "below threshold"
                };
                info!(
                    "   Long {} / Short {} | Diff {} (Threshold {}) {}",
                    opp.long_venue,
                    opp.short_venue,
                    format_rate(opp.spread),
                    format_rate(arb.min_funding_diff),
                    verdict
                );
            }
            None => info!("   Not enough venues to compare"),
        }
    }
    Ok(())
}

/// Logs ticker updates from the EdgeX quote stream until Ctrl-C.
pub async fn stream(cfg: Config, channels: Vec<String>, url: Option<String>) -> Result<()> {
    let url = url.unwrap_or_else(|| cfg.exchanges.edgex.ws_url.clone());
    let client = EdgeXStreamClient::new(url);
    client.connect().await.context("connect EdgeX WebSocket")?;

    for channel in &channels {
        let name = channel.clone();
        client
            .subscribe(channel, move |content| match serde_json::from_value::<TickerContent>(content.clone()) {
                Ok(ticker) => {
                    for t in ticker.data {
                        info!(
                            "📈 {} contract {} last {} index {} mark {}",
                            name, t.contract_id, t.last_price, t.index_price, t.mark_price
                        );
                    }
                }
                Err(_) => info!("📨 {}: {}", name, content),
            })
            .await
            .with_context(|| format!("subscribe to {}", channel))?;
    }
    info!(
        "Subscribed to {:?} on {}. Press Ctrl+C to exit...",
        client.subscribed_channels(),
        client.url()
    );

    let mut reconnect = client.reconnect_signal();
    tokio::select! {
        _ = ctrl_c() => {}
        _ = async {
            match reconnect.as_mut() {
                Some(rx) => { rx.recv().await; }
                None => std::future::pending::<()>().await,
            }
        } => {
            warn!("EdgeX stream dropped; exiting");
        }
    }

    for channel in client.subscribed_channels() {
        if let Err(e) = client.unsubscribe(&channel).await {
            warn!("Unsubscribe from {} failed: {}", channel, e);
        }
    }
    client.close().await.ok();
    Ok(())
}
