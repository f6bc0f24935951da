//! Venue registry - name-keyed adapters assembled once at startup

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use super::VenueAdapter;
use crate::shared::errors::RegistryError;
use crate::shared::types::VenueId;

/// Immutable mapping from venue name to adapter.
///
/// Iteration is in lexical name order.
#[derive(Clone, Default)]
pub struct VenueRegistry {
    venues: BTreeMap<VenueId, Arc<dyn VenueAdapter>>,
}

impl VenueRegistry {
    pub fn builder() -> VenueRegistryBuilder {
        VenueRegistryBuilder::default()
    }

    pub fn get(&self, venue: &VenueId) -> Option<&Arc<dyn VenueAdapter>> {
        self.venues.get(venue)
    }

    pub fn contains(&self, venue: &VenueId) -> bool {
        self.venues.contains_key(venue)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &VenueId> {
        self.venues.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&VenueId, &Arc<dyn VenueAdapter>)> {
        self.venues.iter()
    }
}

impl fmt::Debug for VenueRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VenueRegistry")
            .field("venues", &self.venues.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[derive(Default)]
pub struct VenueRegistryBuilder {
    venues: BTreeMap<VenueId, Arc<dyn VenueAdapter>>,
    duplicate: Option<VenueId>,
}

impl VenueRegistryBuilder {
    pub fn register(mut self, venue: impl Into<VenueId>, adapter: Arc<dyn VenueAdapter>) -> Self {
        let venue = venue.into();
        if self.venues.contains_key(&venue) {
            self.duplicate.get_or_insert(venue);
        } else {
            self.venues.insert(venue, adapter);
        }
        self
    }

    pub fn build(self) -> Result<VenueRegistry, RegistryError> {
        if let Some(venue) = self.duplicate {
            return Err(RegistryError::DuplicateVenue(venue));
        }
        Ok(VenueRegistry {
            venues: self.venues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::venue::mock::MockVenue;

    #[test]
    fn test_registry_iterates_in_name_order() {
        let registry = VenueRegistry::builder()
            .register("lighter", MockVenue::with_rate(0.01).shared())
            .register("edgex", MockVenue::with_rate(0.02).shared())
            .register("hyperliquid", MockVenue::with_rate(0.03).shared())
            .build()
            .unwrap();

        let names: Vec<&str> = registry.names().map(|v| v.as_str()).collect();
        assert_eq!(names, vec!["edgex", "hyperliquid", "lighter"]);
        assert_eq!(registry.len(), 3);
        assert!(registry.contains(&VenueId::from("edgex")));
        assert!(registry.get(&VenueId::from("binance")).is_none());
    }

    #[test]
    fn test_duplicate_venue_rejected() {
        let result = VenueRegistry::builder()
            .register("edgex", MockVenue::with_rate(0.01).shared())
            .register("edgex", MockVenue::with_rate(0.02).shared())
            .build();

        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateVenue(VenueId::from("edgex"))
        );
    }

    #[test]
    fn test_empty_registry() {
        let registry = VenueRegistry::builder().build().unwrap();
        assert!(registry.is_empty());
        assert_eq!(registry.iter().count(), 0);
    }
}
