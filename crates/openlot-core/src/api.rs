//! Remote catalog/auth service collaborator trait.
//!
//! Defines the contract the state layer holds against the remote service,
//! decoupling controllers from the HTTP implementation. Every response on
//! the wire is a `{ success: bool, error?: string, ...data }` envelope;
//! implementations map `success: false` to [`LotError::Rejected`],
//! transport failures to [`LotError::Transport`], and a fired cancellation
//! token to [`LotError::Cancelled`] so the mutation layer can tell a stop
//! apart from a failure.

use crate::chat::{ProposedListing, Role};
use crate::error::Result;
use crate::listing::{Listing, ListingDraft, SortKey};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Query parameters for the catalog listing endpoint.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    /// `None` or `"all"` means no make constraint
    pub make: Option<String>,
    pub search: Option<String>,
    pub sort: Option<SortKey>,
    pub category: Option<String>,
}

/// One history entry carried as chatbot context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub text: String,
}

/// Request body for the chatbot endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub query: String,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_mime_type: Option<String>,
}

/// Assistant reply, optionally carrying a structured listing proposal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    pub text: String,
    #[serde(default)]
    pub proposed_listing: Option<ProposedListing>,
}

/// The remote catalog/auth service.
///
/// Anonymous-capable reads take no token; mutations take the bearer token
/// the caller obtained from [`crate::auth::AuthContext::require_token`].
/// All calls accept a cancellation signal; tearing down the requesting
/// view or an explicit stop cancels the in-flight call.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    /// `GET listings?make&search&sort&category`
    async fn list_listings(
        &self,
        query: &ListingQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>>;

    /// `GET listings/{id}`
    async fn get_listing(&self, id: u64, cancel: &CancellationToken) -> Result<Listing>;

    /// `GET makes`
    async fn list_makes(&self, cancel: &CancellationToken) -> Result<Vec<String>>;

    /// `POST listings` — the server assigns identity, so callers must
    /// re-pull the list after success rather than trusting the draft.
    async fn create_listing(
        &self,
        draft: &ListingDraft,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Listing>;

    /// `PATCH listings/{id}` — returns the server's accepted representation.
    async fn update_listing(
        &self,
        id: u64,
        draft: &ListingDraft,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Listing>;

    /// `DELETE listings/{id}`
    async fn delete_listing(&self, id: u64, token: &str, cancel: &CancellationToken)
    -> Result<()>;

    /// `GET favorites` — hydrated listing list for the current identity.
    async fn list_favorites(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>>;

    /// `POST favorites/{id}`
    async fn add_favorite(&self, id: u64, token: &str, cancel: &CancellationToken) -> Result<()>;

    /// `DELETE favorites/{id}`
    async fn remove_favorite(&self, id: u64, token: &str, cancel: &CancellationToken)
    -> Result<()>;

    /// `POST chatbot` — cancellable assistant turn.
    async fn send_chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply>;

    /// File upload, returning the remote URL.
    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;
}
