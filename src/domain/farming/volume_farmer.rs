//! Volume farmer - opens and immediately closes a small position at random intervals

use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::{FarmingRound, FarmingSettings, FarmingStats};
use crate::domain::venue::VenueRegistry;
use crate::domain::LoopState;
use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, Side};

/// Uniform draw from `[min, max)`. Collapses to `min` when the range is empty.
pub fn sample_interval<R: Rng + ?Sized>(rng: &mut R, min: Duration, max: Duration) -> Duration {
    if max <= min {
        return min;
    }
    rng.gen_range(min..max)
}

pub struct VolumeFarmer {
    registry: Arc<VenueRegistry>,
    settings: FarmingSettings,
    rng: Mutex<StdRng>,
    state: Arc<RwLock<LoopState>>,
    stats: Arc<RwLock<FarmingStats>>,
}

impl VolumeFarmer {
    pub fn new(registry: Arc<VenueRegistry>, settings: FarmingSettings) -> Self {
        Self::with_rng(registry, settings, StdRng::from_entropy())
    }

    pub fn with_rng(registry: Arc<VenueRegistry>, settings: FarmingSettings, rng: StdRng) -> Self {
        Self {
            registry,
            settings,
            rng: Mutex::new(rng),
            state: Arc::new(RwLock::new(LoopState::Idle)),
            stats: Arc::new(RwLock::new(FarmingStats::default())),
        }
    }

    pub fn settings(&self) -> &FarmingSettings {
        &self.settings
    }

    pub async fn state(&self) -> LoopState {
        *self.state.read().await
    }

    pub async fn stats(&self) -> FarmingStats {
        self.stats.read().await.clone()
    }

    fn next_delay(&self) -> Duration {
        let mut rng = self.rng.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        sample_interval(&mut *rng, self.settings.min_interval, self.settings.max_interval)
    }

    /// Waits a random interval, runs a round, repeats until `cancel` fires.
    ///
    /// Cancellation interrupts the wait but never a round in progress.
    pub async fn run(&self, cancel: CancellationToken) {
        *self.state.write().await = LoopState::Running;
        info!(
            "🌾 Starting XP Farming Strategy on {} ({} {} every {:?}-{:?})",
            self.settings.venue,
            self.settings.trade_size,
            self.settings.symbol,
            self.settings.min_interval,
            self.settings.max_interval
        );

        loop {
            let delay = self.next_delay();
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {
                    let _ = self.execute_round().await;
                }
            }
        }

        *self.state.write().await = LoopState::Stopped;
        info!("🛑 Stopping XP Farming Strategy...");
    }

    /// Buy at `price*(1+slippage)`, wait, then reduce-only sell at `price*(1-slippage)`.
    ///
    /// The sell goes out whatever happened to the buy. Returns `None` when
    /// the venue is missing or the price could not be fetched.
    pub async fn execute_round(&self) -> Option<FarmingRound> {
        let venue = &self.settings.venue;
        let symbol = &self.settings.symbol;
        let size = self.settings.trade_size;

        let Some(adapter) = self.registry.get(venue) else {
            warn!("XP Farming: Exchange {} not found", venue);
            return None;
        };

        info!("XP Farming: Executing wash trade on {} for {} {}", venue, size, symbol);

        let price = match adapter.price(symbol).await {
            Ok(price) => price,
            Err(e) => {
                warn!("XP Farming: Failed to get price for {} on {}: {}", symbol, venue, e);
                return None;
            }
        };

        let buy_intent = OrderIntent::limit(symbol.clone(), Side::Buy, size, price * (1.0 + self.settings.max_slippage));
        let buy = adapter.place_order(&buy_intent).await;
        log_order("Buy", &buy);

        tokio::time::sleep(self.settings.settle_delay).await;

        let sell_intent =
            OrderIntent::limit(symbol.clone(), Side::Sell, size, price * (1.0 - self.settings.max_slippage)).reduce_only();
        let sell = adapter.place_order(&sell_intent).await;
        log_order("Sell", &sell);

        let mut stats = self.stats.write().await;
        stats.rounds += 1;
        if buy.is_ok() {
            stats.buys_placed += 1;
            stats.submitted_notional += buy_intent.limit_price * size;
        } else {
            stats.failures += 1;
        }
        if sell.is_ok() {
            stats.sells_placed += 1;
            stats.submitted_notional += sell_intent.limit_price * size;
        } else {
            stats.failures += 1;
        }
        drop(stats);

        Some(FarmingRound { price, buy, sell })
    }
}

fn log_order(label: &str, result: &Result<OrderAck, VenueError>) {
    match result {
        Ok(ack) => info!("XP Farming: {} placed (Status: {}, ID: {})", label, ack.status, ack.order_id),
        Err(e) => error!("XP Farming: {} failed: {}", label, e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::venue::mock::MockVenue;

    fn farmer(venue: Arc<MockVenue>, settings: FarmingSettings) -> VolumeFarmer {
        let registry = VenueRegistry::builder()
            .register("hyperliquid", venue)
            .build()
            .unwrap();
        VolumeFarmer::with_rng(Arc::new(registry), settings, StdRng::seed_from_u64(7))
    }

    #[test]
    fn test_sample_interval_stays_in_half_open_range() {
        let mut rng = StdRng::seed_from_u64(42);
        let min = Duration::from_secs(30);
        let max = Duration::from_secs(120);

        let samples: Vec<Duration> = (0..10_000).map(|_| sample_interval(&mut rng, min, max)).collect();

        assert!(samples.iter().all(|d| *d >= min && *d < max));
        // Both ends of the range get visited.
        assert!(samples.iter().any(|d| *d < Duration::from_secs(35)));
        assert!(samples.iter().any(|d| *d > Duration::from_secs(115)));
    }

    #[test]
    fn test_sample_interval_with_equal_bounds() {
        let mut rng = StdRng::seed_from_u64(1);
        let bound = Duration::from_secs(5);
        assert_eq!(sample_interval(&mut rng, bound, bound), bound);
    }

    #[tokio::test(start_paused = true)]
    async fn test_round_buys_then_sells_reduce_only() {
        let venue = MockVenue::with_rate(0.0).price(1000.0).shared();
        let settings = FarmingSettings {
            max_slippage: 0.005,
            ..FarmingSettings::default()
        };
        let farmer = farmer(venue.clone(), settings);

        let round = farmer.execute_round().await.unwrap();

        assert_eq!(round.price, 1000.0);
        assert!(round.buy.is_ok());
        assert!(round.sell.is_ok());

        let orders = venue.orders();
        assert_eq!(orders.len(), 2);
        assert_eq!(orders[0].side, Side::Buy);
        assert!(!orders[0].reduce_only);
        assert!((orders[0].limit_price - 1005.0).abs() < 1e-9);
        assert_eq!(orders[1].side, Side::Sell);
        assert!(orders[1].reduce_only);
        assert!((orders[1].limit_price - 995.0).abs() < 1e-9);
        assert_eq!(orders[0].size, orders[1].size);
        assert_eq!(orders[0].symbol.as_str(), "ETH");

        let stats = farmer.stats().await;
        assert_eq!(stats.rounds, 1);
        assert_eq!(stats.buys_placed, 1);
        assert_eq!(stats.sells_placed, 1);
        assert!((stats.submitted_notional - 20.0).abs() < 1e-9);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_buy_still_sends_sell() {
        let venue = MockVenue::with_rate(0.0)
            .failing_orders(VenueError::Unauthenticated("no private key".into()))
            .shared();
        let farmer = farmer(venue.clone(), FarmingSettings::default());

        let round = farmer.execute_round().await.unwrap();

        assert!(round.buy.is_err());
        assert!(round.sell.is_err());
        assert_eq!(venue.orders().len(), 2);
        assert!(venue.orders()[1].reduce_only);
        assert_eq!(farmer.stats().await.failures, 2);
    }

    #[tokio::test]
    async fn test_price_failure_skips_round() {
        let venue = MockVenue::with_rate(0.0)
            .failing_price(VenueError::Unreachable("timeout".into()))
            .shared();
        let farmer = farmer(venue.clone(), FarmingSettings::default());

        assert!(farmer.execute_round().await.is_none());
        assert!(venue.orders().is_empty());
        assert_eq!(farmer.stats().await.rounds, 0);
    }

    #[tokio::test]
    async fn test_missing_venue_skips_round() {
        let venue = MockVenue::with_rate(0.0).shared();
        let settings = FarmingSettings {
            venue: "lighter".into(),
            ..FarmingSettings::default()
        };
        let farmer = farmer(venue.clone(), settings);

        assert!(farmer.execute_round().await.is_none());
        assert_eq!(venue.price_calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_stops_on_cancellation() {
        let venue = MockVenue::with_rate(0.0).shared();
        let settings = FarmingSettings {
            min_interval: Duration::from_secs(10),
            max_interval: Duration::from_secs(10),
            ..FarmingSettings::default()
        };
        let farmer = Arc::new(farmer(venue.clone(), settings));
        let cancel = CancellationToken::new();

        let handle = tokio::spawn({
            let farmer = farmer.clone();
            let cancel = cancel.clone();
            async move { farmer.run(cancel).await }
        });

        // Rounds start at 10s and 22s; each takes the 2s settle delay.
        tokio::time::sleep(Duration::from_secs(25)).await;
        assert_eq!(farmer.state().await, LoopState::Running);
        cancel.cancel();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(60)).await;

        assert_eq!(farmer.state().await, LoopState::Stopped);
        assert_eq!(venue.orders().len(), 4);
        assert_eq!(farmer.stats().await.rounds, 2);
    }
}
