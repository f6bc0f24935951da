//! In-memory venue used by unit tests, with fault injection and call recording

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use super::VenueAdapter;
use crate::shared::errors::VenueError;
use crate::shared::types::{OrderAck, OrderIntent, OrderStatus, Position, TradingPair};

pub(crate) struct MockVenue {
    rate: Mutex<Result<f64, VenueError>>,
    price: Mutex<Result<f64, VenueError>>,
    order_failure: Mutex<Option<VenueError>>,
    delay: Duration,
    funding_calls: AtomicUsize,
    price_calls: AtomicUsize,
    orders: Mutex<Vec<OrderIntent>>,
}

impl MockVenue {
    pub(crate) fn with_rate(rate: f64) -> Self {
        Self {
            rate: Mutex::new(Ok(rate)),
            price: Mutex::new(Ok(1000.0)),
            order_failure: Mutex::new(None),
            delay: Duration::ZERO,
            funding_calls: AtomicUsize::new(0),
            price_calls: AtomicUsize::new(0),
            orders: Mutex::new(Vec::new()),
        }
    }

    pub(crate) fn failing_rate(err: VenueError) -> Self {
        let venue = Self::with_rate(0.0);
        *venue.rate.lock().unwrap() = Err(err);
        venue
    }

    pub(crate) fn price(self, price: f64) -> Self {
        *self.price.lock().unwrap() = Ok(price);
        self
    }

    pub(crate) fn failing_price(self, err: VenueError) -> Self {
        *self.price.lock().unwrap() = Err(err);
        self
    }

    pub(crate) fn failing_orders(self, err: VenueError) -> Self {
        *self.order_failure.lock().unwrap() = Some(err);
        self
    }

    /// Every market-data call sleeps this long first.
    pub(crate) fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub(crate) fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub(crate) fn funding_calls(&self) -> usize {
        self.funding_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn price_calls(&self) -> usize {
        self.price_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn orders(&self) -> Vec<OrderIntent> {
        self.orders.lock().unwrap().clone()
    }
}

#[async_trait]
impl VenueAdapter for MockVenue {
    async fn funding_rate(&self, _symbol: &TradingPair) -> Result<f64, VenueError> {
        self.funding_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.rate.lock().unwrap().clone()
    }

    async fn price(&self, _symbol: &TradingPair) -> Result<f64, VenueError> {
        self.price_calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.price.lock().unwrap().clone()
    }

    async fn balance(&self, _asset: &str) -> Result<f64, VenueError> {
        Err(VenueError::unsupported("mock", "balance"))
    }

    async fn position(&self, _symbol: &TradingPair) -> Result<Option<Position>, VenueError> {
        Ok(None)
    }

    async fn place_order(&self, intent: &OrderIntent) -> Result<OrderAck, VenueError> {
        let mut orders = self.orders.lock().unwrap();
        orders.push(intent.clone());
        if let Some(err) = self.order_failure.lock().unwrap().clone() {
            return Err(err);
        }
        Ok(OrderAck {
            order_id: format!("mock-{}", orders.len()),
            status: OrderStatus::Open,
        })
    }

    async fn cancel_order(&self, _symbol: &TradingPair, _order_id: &str) -> Result<(), VenueError> {
        Err(VenueError::unsupported("mock", "cancel_order"))
    }
}
