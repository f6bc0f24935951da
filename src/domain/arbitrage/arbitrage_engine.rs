//! Arbitrage engine - periodic scan loop over the configured pairs

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::RwLock;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::opportunity_scanner::{select_opportunity, OpportunityScanner};
use super::Opportunity;
use crate::domain::execution::{PairedDispatch, PairedExecutor};
use crate::domain::venue::VenueRegistry;
use crate::domain::LoopState;
use crate::shared::types::TradingPair;
use crate::shared::utils::format_rate;

/// Shortest period the engine will tick at.
pub const MIN_CHECK_INTERVAL: Duration = Duration::from_millis(1);

/// Engine configuration
#[derive(Debug, Clone, PartialEq)]
pub struct FundingArbSettings {
    pub pairs: Vec<TradingPair>,
    /// Inclusive: a spread equal to this qualifies.
    pub min_funding_diff: f64,
    pub check_interval: Duration,
    /// When false the engine only reports opportunities.
    pub execute_trades: bool,
}

/// Counters since the engine was created
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub ticks: u64,
    pub pairs_scanned: u64,
    pub opportunities: u64,
    pub dispatches: u64,
}

/// What one tick found and dispatched
#[derive(Debug, Default)]
pub struct TickReport {
    pub pairs_scanned: usize,
    pub opportunities: Vec<Opportunity>,
    pub dispatches: Vec<PairedDispatch>,
}

pub struct ArbitrageEngine {
    settings: FundingArbSettings,
    scanner: OpportunityScanner,
    executor: Arc<PairedExecutor>,
    state: Arc<RwLock<LoopState>>,
    stats: Arc<RwLock<EngineStats>>,
}

impl ArbitrageEngine {
    /// A `check_interval` below [`MIN_CHECK_INTERVAL`] is raised to it.
    pub fn new(
        mut settings: FundingArbSettings,
        registry: Arc<VenueRegistry>,
        executor: Arc<PairedExecutor>,
    ) -> Self {
        if settings.check_interval < MIN_CHECK_INTERVAL {
            warn!(
                "check_interval {:?} is too short, using {:?}",
                settings.check_interval, MIN_CHECK_INTERVAL
            );
            settings.check_interval = MIN_CHECK_INTERVAL;
        }
        Self {
            settings,
            scanner: OpportunityScanner::new(registry),
            executor,
            state: Arc::new(RwLock::new(LoopState::Idle)),
            stats: Arc::new(RwLock::new(EngineStats::default())),
        }
    }

    pub fn settings(&self) -> &FundingArbSettings {
        &self.settings
    }

    pub async fn state(&self) -> LoopState {
        *self.state.read().await
    }

    pub async fn stats(&self) -> EngineStats {
        self.stats.read().await.clone()
    }

    /// Ticks every `check_interval` until `cancel` fires.
    ///
    /// Cancellation is only noticed between ticks: a tick that has started
    /// runs to the end, and legs it dispatched are left running.
    pub async fn run(&self, cancel: CancellationToken) {
        *self.state.write().await = LoopState::Running;
        info!(
            "🚀 Starting Funding Arb Strategy ({} pairs, every {:?}, execute_trades={})",
            self.settings.pairs.len(),
            self.settings.check_interval,
            self.settings.execute_trades
        );

        let period = self.settings.check_interval;
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    // Legs are fire-and-forget; the handles are dropped here.
                    let _ = self.tick().await;
                }
            }
        }

        *self.state.write().await = LoopState::Stopped;
        info!("🛑 Stopping Funding Arb Strategy...");
    }

    /// One pass over the configured pairs, in configuration order.
    pub async fn tick(&self) -> TickReport {
        debug!("Checking funding opportunities...");
        let mut report = TickReport::default();

        for pair in &self.settings.pairs {
            let snapshot = self.scanner.scan(pair).await;
            report.pairs_scanned += 1;

            let Some(opportunity) = select_opportunity(&snapshot) else {
                debug!("[{}] Only {} venue(s) reported a rate - skipping", pair, snapshot.len());
                continue;
            };

            if opportunity.spread < self.settings.min_funding_diff {
                info!(
                    "[{}] Best Diff: {} (Threshold: {}) - No Opportunity",
                    pair,
                    format_rate(opportunity.spread),
                    format_rate(self.settings.min_funding_diff)
                );
                continue;
            }

            info!(
                "💰 OPPORTUNITY FOUND [{}]: Buy on {} (Rate: {}) / Sell on {} (Rate: {}) | Diff: {}",
                pair,
                opportunity.long_venue,
                format_rate(opportunity.long_rate),
                opportunity.short_venue,
                format_rate(opportunity.short_rate),
                format_rate(opportunity.spread)
            );

            if self.settings.execute_trades {
                let dispatch = self.executor.execute(
                    opportunity.pair.clone(),
                    opportunity.long_venue.clone(),
                    opportunity.short_venue.clone(),
                );
                report.dispatches.push(dispatch);
            }
            report.opportunities.push(opportunity);
        }

        let mut stats = self.stats.write().await;
        stats.ticks += 1;
        stats.pairs_scanned += report.pairs_scanned as u64;
        stats.opportunities += report.opportunities.len() as u64;
        stats.dispatches += report.dispatches.len() as u64;

        report
    }
}
