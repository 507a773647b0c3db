//! Favorite set with dual projections.
//!
//! The set of favorited listings is kept in two projections at once: the
//! identifier set (O(1) membership checks for button state) and the
//! hydrated listing list (rendering the favorites page). Every mutation
//! goes through this type so both projections always agree within one
//! state transition.

use crate::listing::Listing;
use std::collections::HashSet;

/// Identifier set plus hydrated list, always in agreement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FavoriteSet {
    ids: HashSet<u64>,
    items: Vec<Listing>,
}

impl FavoriteSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// O(1) membership check driving favorite-button state.
    pub fn contains(&self, id: u64) -> bool {
        self.ids.contains(&id)
    }

    /// Adds a listing to both projections. Idempotent on the id.
    pub fn insert(&mut self, listing: Listing) {
        if self.ids.insert(listing.id) {
            self.items.push(listing);
        }
    }

    /// Removes a listing from both projections.
    pub fn remove(&mut self, id: u64) {
        if self.ids.remove(&id) {
            self.items.retain(|l| l.id != id);
        }
    }

    /// Replaces the whole set from a hydrated server response.
    pub fn replace(&mut self, items: Vec<Listing>) {
        self.ids = items.iter().map(|l| l.id).collect();
        self.items = items;
    }

    /// Detaches all favorites from the local view (logout). The server
    /// copy is untouched.
    pub fn clear(&mut self) {
        self.ids.clear();
        self.items.clear();
    }

    pub fn items(&self) -> &[Listing] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(id: u64) -> Listing {
        Listing {
            id,
            make: "Honda".to_string(),
            model: "Civic".to_string(),
            year: 2020,
            price: 18_500.0,
            currency: "USD".to_string(),
            media: vec![],
            specs: None,
            mileage: None,
            owner_id: None,
            rating: None,
            category: None,
        }
    }

    #[test]
    fn projections_agree_after_each_mutation() {
        let mut set = FavoriteSet::new();
        set.insert(listing(1));
        set.insert(listing(2));
        set.remove(1);

        assert!(!set.contains(1));
        assert!(set.contains(2));
        assert_eq!(set.items().len(), 1);
        assert_eq!(set.items()[0].id, 2);
    }

    #[test]
    fn insert_is_idempotent_per_id() {
        let mut set = FavoriteSet::new();
        set.insert(listing(1));
        set.insert(listing(1));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn replace_rebuilds_both_projections() {
        let mut set = FavoriteSet::new();
        set.insert(listing(1));
        set.replace(vec![listing(2), listing(3)]);
        assert!(!set.contains(1));
        assert!(set.contains(2) && set.contains(3));
        assert_eq!(set.len(), 2);
    }
}
