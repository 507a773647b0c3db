//! Favorites controller.
//!
//! Wraps the dual-projection [`FavoriteSet`] in the optimistic mutation
//! pattern: a toggle is visible immediately, the matching remote call runs
//! afterwards, and a failure settles back to the exact pre-toggle state
//! with a user-visible notice. Rapid repeated toggles are independent
//! mutation instances; the controller does not debounce user intent.

use crate::mutation::{MutationOutcome, OptimisticMutation};
use crate::notice::NoticeSink;
use openlot_core::api::CatalogApi;
use openlot_core::auth::AuthContext;
use openlot_core::error::Result;
use openlot_core::favorite::FavoriteSet;
use openlot_core::listing::Listing;
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

pub struct FavoritesService {
    api: Arc<dyn CatalogApi>,
    notices: Arc<NoticeSink>,
    state: Mutex<FavoriteSet>,
}

impl FavoritesService {
    pub fn new(api: Arc<dyn CatalogApi>, notices: Arc<NoticeSink>) -> Self {
        Self {
            api,
            notices,
            state: Mutex::new(FavoriteSet::new()),
        }
    }

    /// Membership check driving favorite-button state.
    pub fn contains(&self, id: u64) -> bool {
        self.state.lock().unwrap().contains(id)
    }

    /// Hydrated favorites for the dedicated page.
    pub fn favorites(&self) -> Vec<Listing> {
        self.state.lock().unwrap().items().to_vec()
    }

    /// Toggles a listing in or out of the favorite set, optimistically.
    ///
    /// Requires an identity; the auth check is the only one that runs
    /// before the optimistic apply, so an anonymous toggle changes nothing
    /// at all. Both projections flip within one state transition.
    pub async fn toggle(
        &self,
        listing: &Listing,
        auth: &AuthContext,
        cancel: &CancellationToken,
    ) -> Result<MutationOutcome> {
        let token = auth.require_token()?.to_string();

        let (mutation, adding) = {
            let mut state = self.state.lock().unwrap();
            let adding = !state.contains(listing.id);
            let mutation = OptimisticMutation::begin(&mut *state, |s| {
                if adding {
                    s.insert(listing.clone());
                } else {
                    s.remove(listing.id);
                }
            });
            (mutation, adding)
        };

        let remote = if adding {
            self.api.add_favorite(listing.id, &token, cancel).await
        } else {
            self.api.remove_favorite(listing.id, &token, cancel).await
        };

        let outcome = {
            let mut state = self.state.lock().unwrap();
            mutation.settle(&mut *state, remote).0
        };
        self.notices.report(&outcome);
        Ok(outcome)
    }

    /// Rehydrates the set from the server.
    pub async fn refresh(&self, auth: &AuthContext, cancel: &CancellationToken) -> Result<()> {
        let token = auth.require_token()?.to_string();
        match self.api.list_favorites(&token, cancel).await {
            Ok(items) => {
                self.state.lock().unwrap().replace(items);
                Ok(())
            }
            Err(err) if err.is_cancelled() => Err(err),
            Err(err) => {
                self.notices.failure(err.user_message());
                Err(err)
            }
        }
    }

    /// Detaches favorites from the local view on logout. The server-side
    /// set is untouched.
    pub fn detach(&self) {
        self.state.lock().unwrap().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notice::NoticeKind;
    use async_trait::async_trait;
    use openlot_core::api::{ChatReply, ChatRequest, ListingQuery};
    use openlot_core::error::LotError;
    use openlot_core::listing::ListingDraft;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

    #[derive(Default)]
    struct MockApi {
        fail_favorites: AtomicBool,
        calls: AtomicUsize,
        favorites: Mutex<Vec<Listing>>,
    }

    impl MockApi {
        fn failing() -> Self {
            let api = Self::default();
            api.fail_favorites.store(true, Ordering::SeqCst);
            api
        }

        fn favorite_result(&self) -> Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail_favorites.load(Ordering::SeqCst) {
                Err(LotError::rejected("favorites unavailable"))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl CatalogApi for MockApi {
        async fn list_listings(
            &self,
            _query: &ListingQuery,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Listing>> {
            Ok(vec![])
        }

        async fn get_listing(&self, id: u64, _cancel: &CancellationToken) -> Result<Listing> {
            Err(LotError::not_found("listing", id.to_string()))
        }

        async fn list_makes(&self, _cancel: &CancellationToken) -> Result<Vec<String>> {
            Ok(vec![])
        }

        async fn create_listing(
            &self,
            _draft: &ListingDraft,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<Listing> {
            unreachable!("not used by favorites tests")
        }

        async fn update_listing(
            &self,
            _id: u64,
            _draft: &ListingDraft,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<Listing> {
            unreachable!("not used by favorites tests")
        }

        async fn delete_listing(
            &self,
            _id: u64,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<()> {
            unreachable!("not used by favorites tests")
        }

        async fn list_favorites(
            &self,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<Vec<Listing>> {
            Ok(self.favorites.lock().unwrap().clone())
        }

        async fn add_favorite(
            &self,
            _id: u64,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<()> {
            self.favorite_result()
        }

        async fn remove_favorite(
            &self,
            _id: u64,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<()> {
            self.favorite_result()
        }

        async fn send_chat(
            &self,
            _request: &ChatRequest,
            _cancel: &CancellationToken,
        ) -> Result<ChatReply> {
            unreachable!("not used by favorites tests")
        }

        async fn upload_file(
            &self,
            _bytes: &[u8],
            _mime_type: &str,
            _token: &str,
            _cancel: &CancellationToken,
        ) -> Result<String> {
            unreachable!("not used by favorites tests")
        }
    }

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

    fn authed() -> AuthContext {
        AuthContext {
            token: Some("tok".to_string()),
            user: None,
        }
    }

    fn service(api: MockApi) -> (Arc<MockApi>, FavoritesService) {
        let api = Arc::new(api);
        let service = FavoritesService::new(api.clone(), Arc::new(NoticeSink::new()));
        (api, service)
    }

    #[tokio::test]
    async fn toggle_success_updates_both_projections() {
        let (_api, service) = service(MockApi::default());
        let outcome = service
            .toggle(&listing(42), &authed(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(outcome, MutationOutcome::Confirmed);
        assert!(service.contains(42));
        assert_eq!(service.favorites().len(), 1);
        assert_eq!(service.favorites()[0].id, 42);
    }

    #[tokio::test]
    async fn toggle_failure_settles_back_to_pretoggle_state() {
        let (_api, service) = service(MockApi::failing());
        let outcome = service
            .toggle(&listing(42), &authed(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(matches!(outcome, MutationOutcome::RolledBack { .. }));
        assert!(!service.contains(42));
        assert!(service.favorites().is_empty());
        let notice = service.notices.latest().unwrap();
        assert_eq!(notice.kind, NoticeKind::Failure);
        assert_eq!(notice.message, "favorites unavailable");
    }

    #[tokio::test]
    async fn anonymous_toggle_changes_nothing() {
        let (api, service) = service(MockApi::default());
        let err = service
            .toggle(&listing(42), &AuthContext::anonymous(), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.is_auth_required());
        assert!(!service.contains(42));
        // The auth check runs before the optimistic apply and before any
        // network call.
        assert_eq!(api.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn repeated_toggles_are_independent_transitions() {
        let (api, service) = service(MockApi::default());
        let auth = authed();
        let cancel = CancellationToken::new();
        let target = listing(42);

        service.toggle(&target, &auth, &cancel).await.unwrap();
        service.toggle(&target, &auth, &cancel).await.unwrap();
        service.toggle(&target, &auth, &cancel).await.unwrap();

        assert!(service.contains(42));
        assert_eq!(api.calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn refresh_replaces_the_hydrated_set() {
        let api = MockApi::default();
        *api.favorites.lock().unwrap() = vec![listing(1), listing(2)];
        let (_api, service) = service(api);

        service
            .refresh(&authed(), &CancellationToken::new())
            .await
            .unwrap();
        assert!(service.contains(1) && service.contains(2));

        service.detach();
        assert!(service.favorites().is_empty());
    }
}
