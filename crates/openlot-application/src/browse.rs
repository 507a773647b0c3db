//! Listing browse state.
//!
//! Owns the in-memory catalog dataset and everything derived from it: the
//! filter state, the memoized query selection, the taxonomy index, and the
//! displayed-price currency preference. Listing CRUD runs through the
//! optimistic mutation controller; creation is structural (the server
//! assigns identity) and is therefore followed by a fresh list pull.

use crate::mutation::{MutationOutcome, OptimisticMutation};
use crate::notice::NoticeSink;
use openlot_core::api::{CatalogApi, ListingQuery};
use openlot_core::auth::AuthContext;
use openlot_core::catalog::{Taxonomy, with_current};
use openlot_core::currency;
use openlot_core::error::Result;
use openlot_core::listing::{self, Listing, ListingDraft, QueryFilter, QueryPage, SortKey};
use openlot_core::store::{ProfileStore, ProfileStoreExt, StoreKey, StoreNamespace};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

const DEFAULT_CURRENCY: &str = "USD";

#[derive(Default)]
struct BrowseState {
    listings: Vec<Listing>,
    /// Bumped on every dataset change; part of the memoization key.
    generation: u64,
    filter: QueryFilter,
    /// Filtered+sorted match set, keyed on the generation and the filter's
    /// selection fields. Pages are sliced out of it; a page change alone
    /// never invalidates it.
    selection: Option<(u64, QueryFilter, Vec<Listing>)>,
    /// Times the selection stages have run.
    selection_runs: u64,
    taxonomy: Option<Arc<Taxonomy>>,
}

impl BrowseState {
    /// Invalidates everything derived from the dataset.
    fn touch_dataset(&mut self) {
        self.generation += 1;
        self.selection = None;
        self.taxonomy = None;
    }
}

pub struct BrowseService {
    api: Arc<dyn CatalogApi>,
    store: Arc<dyn ProfileStore>,
    notices: Arc<NoticeSink>,
    state: Mutex<BrowseState>,
}

impl BrowseService {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        store: Arc<dyn ProfileStore>,
        notices: Arc<NoticeSink>,
    ) -> Self {
        Self {
            api,
            store,
            notices,
            state: Mutex::new(BrowseState::default()),
        }
    }

    /// Pulls the full catalog dataset from the service.
    pub async fn load(&self, cancel: &CancellationToken) -> Result<()> {
        match self.api.list_listings(&ListingQuery::default(), cancel).await {
            Ok(listings) => {
                self.set_dataset(listings);
                Ok(())
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                self.notices.failure(err.user_message());
                Err(err)
            }
        }
    }

    /// Resolves a single listing for the detail view, serving it from the
    /// in-memory dataset when present and falling back to the service.
    pub async fn listing_details(&self, id: u64, cancel: &CancellationToken) -> Result<Listing> {
        let local = {
            let state = self.state.lock().unwrap();
            state.listings.iter().find(|l| l.id == id).cloned()
        };
        if let Some(listing) = local {
            return Ok(listing);
        }
        match self.api.get_listing(id, cancel).await {
            Ok(listing) => Ok(listing),
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                self.notices.failure(err.user_message());
                Err(err)
            }
        }
    }

    /// Replaces the backing dataset, invalidating derived state.
    pub fn set_dataset(&self, listings: Vec<Listing>) {
        let mut state = self.state.lock().unwrap();
        state.listings = listings;
        state.touch_dataset();
    }

    // ------------------------------------------------------------------
    // Filter state. Changing anything except the page resets to page 1.
    // ------------------------------------------------------------------

    pub fn filter(&self) -> QueryFilter {
        self.state.lock().unwrap().filter.clone()
    }

    pub fn set_make(&self, make: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.filter.make = make.into();
        state.filter.page = 1;
    }

    pub fn set_search(&self, search: impl Into<String>) {
        let mut state = self.state.lock().unwrap();
        state.filter.search = search.into();
        state.filter.page = 1;
    }

    pub fn set_sort(&self, sort: SortKey) {
        let mut state = self.state.lock().unwrap();
        state.filter.sort = sort;
        state.filter.page = 1;
    }

    pub fn set_category(&self, category: Option<String>) {
        let mut state = self.state.lock().unwrap();
        state.filter.category = category;
        state.filter.page = 1;
    }

    /// Changes only the page; the filtered/sorted result is re-sliced, not
    /// re-derived.
    pub fn set_page(&self, page: usize) {
        self.state.lock().unwrap().filter.page = page.max(1);
    }

    /// The current derived page.
    ///
    /// The filter+sort selection is memoized on the (dataset generation,
    /// selection fields) pair; only a dataset or selection change re-runs
    /// it. Page changes slice a fresh window out of the memoized set.
    pub fn page(&self) -> QueryPage {
        let mut state = self.state.lock().unwrap();
        if let Some((generation, filter, matched)) = &state.selection {
            if *generation == state.generation && filter.same_selection(&state.filter) {
                return listing::slice(matched, state.filter.page);
            }
        }
        let matched = listing::select(&state.listings, &state.filter);
        state.selection_runs += 1;
        let page = listing::slice(&matched, state.filter.page);
        state.selection = Some((state.generation, state.filter.clone(), matched));
        page
    }

    #[cfg(test)]
    fn selection_runs(&self) -> u64 {
        self.state.lock().unwrap().selection_runs
    }

    // ------------------------------------------------------------------
    // Taxonomy-driven selectors
    // ------------------------------------------------------------------

    fn taxonomy(&self) -> Arc<Taxonomy> {
        let mut state = self.state.lock().unwrap();
        if let Some(taxonomy) = &state.taxonomy {
            return taxonomy.clone();
        }
        let taxonomy = Arc::new(Taxonomy::index(&state.listings));
        state.taxonomy = Some(taxonomy.clone());
        taxonomy
    }

    pub fn makes(&self) -> Vec<String> {
        self.taxonomy().makes()
    }

    /// Models for a make, with the user's current free-text selection
    /// appended when the index does not offer it.
    pub fn models_for(&self, make: &str, current: Option<&str>) -> Vec<String> {
        with_current(self.taxonomy().models_for(make), current)
    }

    pub fn engines_for(&self, make: &str, model: &str, current: Option<&str>) -> Vec<String> {
        with_current(self.taxonomy().engines_for(make, model), current)
    }

    // ------------------------------------------------------------------
    // Currency preference (identity-independent, persisted)
    // ------------------------------------------------------------------

    pub fn active_currency(&self) -> String {
        let code: String = self.store.read(&StoreKey::global(StoreNamespace::Currency));
        if code.is_empty() {
            DEFAULT_CURRENCY.to_string()
        } else {
            code
        }
    }

    pub fn set_currency(&self, code: impl Into<String>) -> Result<()> {
        self.store
            .write(&StoreKey::global(StoreNamespace::Currency), &code.into())
    }

    /// Renders a listing price in the active display currency.
    pub fn display_price(&self, listing: &Listing) -> String {
        let active = self.active_currency();
        let converted = currency::convert(listing.price, &listing.currency, &active);
        currency::format(Some(converted), &active)
    }

    // ------------------------------------------------------------------
    // Listing CRUD (mutation controller)
    // ------------------------------------------------------------------

    /// Creates a listing. Structural mutation: a provisional copy is shown
    /// optimistically, and success triggers a fresh list pull because the
    /// server assigns the identity (and may normalize fields).
    pub async fn create_listing(
        &self,
        draft: ListingDraft,
        auth: &AuthContext,
        cancel: &CancellationToken,
    ) -> Result<MutationOutcome> {
        let token = auth.require_token()?.to_string();
        let provisional = draft.clone().into_provisional(auth.identity().map(str::to_string));

        let mutation = {
            let mut state = self.state.lock().unwrap();
            let mutation = OptimisticMutation::begin(&mut state.listings, |ls| {
                ls.push(provisional);
            });
            state.touch_dataset();
            mutation
        };

        let remote = self.api.create_listing(&draft, &token, cancel).await;

        let outcome = {
            let mut state = self.state.lock().unwrap();
            let (outcome, _created) = mutation.settle(&mut state.listings, remote);
            state.touch_dataset();
            outcome
        };
        self.notices.report(&outcome);

        if outcome == MutationOutcome::Confirmed {
            // Replace the provisional copy with the server's view. The
            // creation already committed server-side, so a failed refresh
            // (which posts its own notice) does not change the outcome.
            if let Err(err) = self.load(cancel).await {
                tracing::warn!(error = %err, "refresh after listing creation failed");
            }
        }
        Ok(outcome)
    }

    /// Updates a listing optimistically, reconciling with the server's
    /// accepted representation on success.
    pub async fn update_listing(
        &self,
        id: u64,
        draft: ListingDraft,
        auth: &AuthContext,
        cancel: &CancellationToken,
    ) -> Result<MutationOutcome> {
        let token = auth.require_token()?.to_string();

        let mutation = {
            let mut state = self.state.lock().unwrap();
            let mutation = OptimisticMutation::begin(&mut state.listings, |ls| {
                if let Some(target) = ls.iter_mut().find(|l| l.id == id) {
                    draft.apply_to(target);
                }
            });
            state.touch_dataset();
            mutation
        };

        let remote = self.api.update_listing(id, &draft, &token, cancel).await;

        let outcome = {
            let mut state = self.state.lock().unwrap();
            let (outcome, accepted) = mutation.settle(&mut state.listings, remote);
            if let Some(accepted) = accepted {
                if let Some(target) = state.listings.iter_mut().find(|l| l.id == id) {
                    *target = accepted;
                }
            }
            state.touch_dataset();
            outcome
        };
        self.notices.report(&outcome);
        Ok(outcome)
    }

    /// Deletes a listing optimistically.
    pub async fn delete_listing(
        &self,
        id: u64,
        auth: &AuthContext,
        cancel: &CancellationToken,
    ) -> Result<MutationOutcome> {
        let token = auth.require_token()?.to_string();

        let mutation = {
            let mut state = self.state.lock().unwrap();
            let mutation = OptimisticMutation::begin(&mut state.listings, |ls| {
                ls.retain(|l| l.id != id);
            });
            state.touch_dataset();
            mutation
        };

        let remote = self.api.delete_listing(id, &token, cancel).await;

        let outcome = {
            let mut state = self.state.lock().unwrap();
            let (outcome, _) = mutation.settle(&mut state.listings, remote);
            state.touch_dataset();
            outcome
        };
        self.notices.report(&outcome);
        Ok(outcome)
    }
}
