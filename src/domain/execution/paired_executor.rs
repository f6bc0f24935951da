//! Paired execution coordinator - long on the cheap venue, short on the rich one

use std::sync::Arc;

use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::{error, info};

use super::{ExecutionSettings, LegFill, LegReport, PairedDispatch};
use crate::domain::venue::{VenueAdapter, VenueRegistry};
use crate::shared::errors::LegError;
use crate::shared::types::{OrderIntent, Side, TradingPair, VenueId};
use crate::shared::utils::protective_limit_price;

/// Places both legs of an arbitrage as separate tasks.
///
/// There is no atomicity between legs: one may succeed while the other
/// fails, and nothing here retries or unwinds the survivor.
pub struct PairedExecutor {
    registry: Arc<VenueRegistry>,
    settings: ExecutionSettings,
    observer: Option<UnboundedSender<LegReport>>,
}

impl PairedExecutor {
    pub fn new(registry: Arc<VenueRegistry>, settings: ExecutionSettings) -> Self {
        Self {
            registry,
            settings,
            observer: None,
        }
    }

    /// Every finished leg is also sent here.
    pub fn with_observer(mut self, observer: UnboundedSender<LegReport>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn settings(&self) -> &ExecutionSettings {
        &self.settings
    }

    /// Spawns the long and short legs and returns immediately.
    pub fn execute(&self, pair: TradingPair, long_venue: VenueId, short_venue: VenueId) -> PairedDispatch {
        info!(
            "⚡ Executing Arbitrage: Long {} {} on {}, Short {} {} on {}",
            self.settings.trade_size, pair, long_venue, self.settings.trade_size, pair, short_venue
        );

        let long = self.spawn_leg(pair.clone(), long_venue, Side::Buy);
        let short = self.spawn_leg(pair, short_venue, Side::Sell);
        PairedDispatch { long, short }
    }

    fn spawn_leg(&self, pair: TradingPair, venue: VenueId, side: Side) -> JoinHandle<LegReport> {
        let adapter = self.registry.get(&venue).cloned();
        let settings = self.settings.clone();
        let observer = self.observer.clone();

        tokio::spawn(async move {
            let outcome = run_leg(adapter, &venue, &pair, side, &settings).await;
            match &outcome {
                Ok(fill) => info!(
                    "✅ Placed {} on {} at {} (Status: {}, ID: {})",
                    leg_label(side),
                    venue,
                    fill.limit_price,
                    fill.ack.status,
                    fill.ack.order_id
                ),
                Err(e) => error!("❌ Failed to place {} on {} for {}: {}", leg_label(side), venue, pair, e),
            }

            let report = LegReport {
                venue,
                pair,
                side,
                outcome,
            };
            if let Some(observer) = observer {
                // Receiver gone just means nobody is watching.
                let _ = observer.send(report.clone());
            }
            report
        })
    }
}

async fn run_leg(
    adapter: Option<Arc<dyn VenueAdapter>>,
    venue: &VenueId,
    pair: &TradingPair,
    side: Side,
    settings: &ExecutionSettings,
) -> Result<LegFill, LegError> {
    let adapter = adapter.ok_or_else(|| LegError::UnknownVenue(venue.clone()))?;

    let price = adapter.price(pair).await.map_err(LegError::PriceFetch)?;
    let limit_price = protective_limit_price(price, side, settings.slippage_buffer);

    let intent = OrderIntent::limit(pair.clone(), side, settings.trade_size, limit_price);
    let ack = adapter.place_order(&intent).await.map_err(LegError::PlaceOrder)?;

    Ok(LegFill { limit_price, ack })
}

fn leg_label(side: Side) -> &'static str {
    match side {
        Side::Buy => "Long",
        Side::Sell => "Short",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::venue::mock::MockVenue;
    use crate::shared::errors::VenueError;
    use crate::shared::types::OrderType;
    use tokio::sync::mpsc;

    fn registry(venues: Vec<(&str, Arc<MockVenue>)>) -> Arc<VenueRegistry> {
        let mut builder = VenueRegistry::builder();
        for (name, venue) in venues {
            builder = builder.register(name, venue);
        }
        Arc::new(builder.build().unwrap())
    }

    #[tokio::test]
    async fn test_legs_use_fresh_price_and_protective_limits() {
        let long = MockVenue::with_rate(-0.02).price(2000.0).shared();
        let short = MockVenue::with_rate(0.03).price(1000.0).shared();
        let executor = PairedExecutor::new(
            registry(vec![("alpha", long.clone()), ("beta", short.clone())]),
            ExecutionSettings::default(),
        );

        let (long_report, short_report) = executor
            .execute("ETH-USD".into(), "alpha".into(), "beta".into())
            .join()
            .await;
        let long_report = long_report.unwrap();
        let short_report = short_report.unwrap();

        assert!(long_report.is_success());
        assert!(short_report.is_success());
        assert_eq!(long.price_calls(), 1);
        assert_eq!(short.price_calls(), 1);

        let buy = &long.orders()[0];
        assert_eq!(buy.side, Side::Buy);
        assert_eq!(buy.order_type, OrderType::Limit);
        assert!(!buy.reduce_only);
        assert_eq!(buy.size, 0.01);
        assert!((buy.limit_price - 2020.0).abs() < 1e-9);

        let sell = &short.orders()[0];
        assert_eq!(sell.side, Side::Sell);
        assert!((sell.limit_price - 990.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_short_order_failure_does_not_stop_long_leg() {
        let long = MockVenue::with_rate(-0.02).shared();
        let short = MockVenue::with_rate(0.03)
            .failing_orders(VenueError::Protocol("order rejected".into()))
            .shared();
        let (tx, mut rx) = mpsc::unbounded_channel();
        let executor = PairedExecutor::new(
            registry(vec![("alpha", long.clone()), ("beta", short.clone())]),
            ExecutionSettings::default(),
        )
        .with_observer(tx);

        // Detached, exactly as the engine does it.
        drop(executor.execute("ETH-USD".into(), "alpha".into(), "beta".into()));

        let mut reports = vec![rx.recv().await.unwrap(), rx.recv().await.unwrap()];
        reports.sort_by_key(|r| r.venue.clone());

        assert_eq!(reports[0].venue.as_str(), "alpha");
        assert!(reports[0].is_success());
        assert_eq!(
            reports[1].outcome,
            Err(LegError::PlaceOrder(VenueError::Protocol("order rejected".into())))
        );
        assert_eq!(long.orders().len(), 1);
        assert_eq!(short.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_long_price_failure_still_places_short() {
        let long = MockVenue::with_rate(-0.02)
            .failing_price(VenueError::Unreachable("connection reset".into()))
            .shared();
        let short = MockVenue::with_rate(0.03).shared();
        let executor = PairedExecutor::new(
            registry(vec![("alpha", long.clone()), ("beta", short.clone())]),
            ExecutionSettings::default(),
        );

        let (long_report, short_report) = executor
            .execute("BTC-USD".into(), "alpha".into(), "beta".into())
            .join()
            .await;

        assert!(matches!(long_report.unwrap().outcome, Err(LegError::PriceFetch(_))));
        assert!(short_report.unwrap().is_success());
        assert!(long.orders().is_empty());
        assert_eq!(short.orders().len(), 1);
    }

    #[tokio::test]
    async fn test_unknown_venue_fails_only_that_leg() {
        let short = MockVenue::with_rate(0.03).shared();
        let executor = PairedExecutor::new(
            registry(vec![("beta", short.clone())]),
            ExecutionSettings {
                trade_size: 0.5,
                slippage_buffer: 0.0,
            },
        );

        let (long_report, short_report) = executor
            .execute("ETH-USD".into(), "ghost".into(), "beta".into())
            .join()
            .await;

        assert_eq!(
            long_report.unwrap().outcome,
            Err(LegError::UnknownVenue(VenueId::from("ghost")))
        );
        let fill = short_report.unwrap().outcome.unwrap();
        assert_eq!(fill.limit_price, 1000.0);
        assert_eq!(short.orders()[0].size, 0.5);
    }
}
