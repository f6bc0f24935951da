//! Opportunity scanner - cross-venue funding rate comparison

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures::future::join_all;
use tracing::{debug, warn};

use super::Opportunity;
use crate::domain::venue::VenueRegistry;
use crate::shared::types::{RateQuote, TradingPair, VenueId};
use crate::shared::utils;

/// Funding rates for one pair gathered in a single scan pass.
///
/// A venue missing from the map failed to answer or is not registered;
/// it is never treated as a zero rate.
#[derive(Debug, Clone, PartialEq)]
pub struct RateSnapshot {
    pub pair: TradingPair,
    pub rates: BTreeMap<VenueId, f64>,
    pub taken_at: DateTime<Utc>,
}

impl RateSnapshot {
    pub fn new(pair: TradingPair) -> Self {
        Self {
            pair,
            rates: BTreeMap::new(),
            taken_at: Utc::now(),
        }
    }

    pub fn from_rates<I, V>(pair: TradingPair, rates: I) -> Self
    where
        I: IntoIterator<Item = (V, f64)>,
        V: Into<VenueId>,
    {
        let mut snapshot = Self::new(pair);
        snapshot.rates = rates.into_iter().map(|(v, r)| (v.into(), r)).collect();
        snapshot
    }

    pub fn insert(&mut self, quote: RateQuote) {
        self.rates.insert(quote.venue, quote.rate);
    }

    pub fn get(&self, venue: &VenueId) -> Option<f64> {
        self.rates.get(venue).copied()
    }

    pub fn len(&self) -> usize {
        self.rates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rates.is_empty()
    }

    pub fn venues(&self) -> impl Iterator<Item = &VenueId> {
        self.rates.keys()
    }
}

/// Queries every registered venue for a pair's current funding rate
pub struct OpportunityScanner {
    registry: Arc<VenueRegistry>,
}

impl OpportunityScanner {
    pub fn new(registry: Arc<VenueRegistry>) -> Self {
        Self { registry }
    }

    pub fn registry(&self) -> &Arc<VenueRegistry> {
        &self.registry
    }

    /// Venue failures are logged and the venue left out; the scan itself never fails.
    pub async fn scan(&self, pair: &TradingPair) -> RateSnapshot {
        let queries = self.registry.iter().map(|(venue, adapter)| async move {
            (venue, adapter.funding_rate(pair).await)
        });
        let results = join_all(queries).await;

        let mut snapshot = RateSnapshot::new(pair.clone());
        for (venue, result) in results {
            match result {
                Ok(rate) if rate.is_finite() => {
                    debug!("[{}] {} Funding Rate: {}", venue, pair, utils::format_rate(rate));
                    snapshot.insert(RateQuote::now(venue.clone(), pair.clone(), rate));
                }
                Ok(rate) => {
                    warn!("Discarding non-finite funding rate {} from {} for {}", rate, venue, pair);
                }
                Err(e) => {
                    warn!("Error getting funding rate from {} for {}: {}", venue, pair, e);
                }
            }
        }
        snapshot
    }
}

/// Picks the widest long/short venue pair from a snapshot.
///
/// Long is the lexically first venue holding the lowest rate. Short is the
/// lexically first venue holding the highest rate among the remaining
/// venues, so the two legs never land on the same venue. Needs at least
/// two rates.
pub fn select_opportunity(snapshot: &RateSnapshot) -> Option<Opportunity> {
    if snapshot.len() < 2 {
        return None;
    }

    let (long_venue, long_rate) = snapshot
        .rates
        .iter()
        .fold(None, |best: Option<(&VenueId, f64)>, (venue, &rate)| match best {
            Some((_, best_rate)) if rate >= best_rate => best,
            _ => Some((venue, rate)),
        })?;

    let (short_venue, short_rate) = snapshot
        .rates
        .iter()
        .filter(|(venue, _)| *venue != long_venue)
        .fold(None, |best: Option<(&VenueId, f64)>, (venue, &rate)| match best {
            Some((_, best_rate)) if rate <= best_rate => best,
            _ => Some((venue, rate)),
        })?;

    Some(Opportunity {
        id: utils::generate_id(),
        pair: snapshot.pair.clone(),
        long_venue: long_venue.clone(),
        long_rate,
        short_venue: short_venue.clone(),
        short_rate,
        spread: short_rate - long_rate,
        detected_at: Utc::now(),
    })
}
