//! HTTP implementation of the catalog service collaborator.
//!
//! Every response goes through the `{ success, error?, ...data }` envelope:
//! `success: false` becomes a business rejection carrying the server's
//! message, transport-level problems become [`LotError::Transport`], and a
//! fired cancellation token aborts the call with [`LotError::Cancelled`].
//! Cancellation is checked with a biased select so a stop that races a
//! response still reports as stopped.

use openlot_core::api::{CatalogApi, ChatReply, ChatRequest, ListingQuery};
use openlot_core::error::{LotError, Result};
use openlot_core::listing::{Listing, ListingDraft, SortKey};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Catalog service client over HTTP.
#[derive(Clone)]
pub struct HttpCatalogApi {
    client: Client,
    base_url: String,
}

impl HttpCatalogApi {
    /// Creates a client against the given base URL.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| LotError::internal(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    /// Sends a request and decodes the response envelope, racing the
    /// cancellation token at every suspension point.
    async fn execute(&self, request: RequestBuilder, cancel: &CancellationToken) -> Result<Value> {
        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LotError::Cancelled),
            result = request.send() => result.map_err(transport_error)?,
        };
        let status = response.status();
        let body = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(LotError::Cancelled),
            result = response.text() => result.map_err(transport_error)?,
        };
        decode_envelope(&body, status)
    }

    /// Like [`execute`](Self::execute) but extracts one payload field.
    async fn execute_payload<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        cancel: &CancellationToken,
        field: &str,
    ) -> Result<T> {
        let envelope = self.execute(request, cancel).await?;
        payload(envelope, field)
    }
}

fn transport_error(err: reqwest::Error) -> LotError {
    tracing::debug!(error = %err, "transport failure");
    LotError::transport(err.to_string())
}

/// Decodes the `{ success, error?, ...data }` envelope.
fn decode_envelope(body: &str, status: StatusCode) -> Result<Value> {
    let value: Value = serde_json::from_str(body)
        .map_err(|_| LotError::transport(format!("undecodable response (status {status})")))?;
    match value.get("success").and_then(Value::as_bool) {
        Some(true) => Ok(value),
        Some(false) => {
            let message = value
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("request rejected")
                .to_string();
            Err(LotError::rejected(message))
        }
        None if status.is_success() => Ok(value),
        None => Err(LotError::transport(format!("unexpected status {status}"))),
    }
}

/// Pulls one named field out of a decoded envelope.
fn payload<T: DeserializeOwned>(envelope: Value, field: &str) -> Result<T> {
    let value = envelope.get(field).cloned().ok_or_else(|| {
        LotError::Serialization {
            message: format!("response envelope missing field '{field}'"),
        }
    })?;
    Ok(serde_json::from_value(value)?)
}

fn listing_query_params(query: &ListingQuery) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(make) = &query.make {
        if make != "all" {
            params.push(("make", make.clone()));
        }
    }
    if let Some(search) = &query.search {
        if !search.is_empty() {
            params.push(("search", search.clone()));
        }
    }
    if let Some(sort) = query.sort {
        if sort != SortKey::Default {
            params.push(("sort", sort.as_str().to_string()));
        }
    }
    if let Some(category) = &query.category {
        params.push(("category", category.clone()));
    }
    params
}

#[async_trait]
impl CatalogApi for HttpCatalogApi {
    async fn list_listings(
        &self,
        query: &ListingQuery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        let request = self
            .client
            .get(self.url("listings"))
            .query(&listing_query_params(query));
        self.execute_payload(request, cancel, "listings").await
    }

    async fn get_listing(&self, id: u64, cancel: &CancellationToken) -> Result<Listing> {
        let request = self.client.get(self.url(&format!("listings/{id}")));
        self.execute_payload(request, cancel, "listing").await
    }

    async fn list_makes(&self, cancel: &CancellationToken) -> Result<Vec<String>> {
        let request = self.client.get(self.url("makes"));
        self.execute_payload(request, cancel, "makes").await
    }

    async fn create_listing(
        &self,
        draft: &ListingDraft,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Listing> {
        let request = self
            .client
            .post(self.url("listings"))
            .bearer_auth(token)
            .json(draft);
        self.execute_payload(request, cancel, "listing").await
    }

    async fn update_listing(
        &self,
        id: u64,
        draft: &ListingDraft,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Listing> {
        let request = self
            .client
            .patch(self.url(&format!("listings/{id}")))
            .bearer_auth(token)
            .json(draft);
        self.execute_payload(request, cancel, "listing").await
    }

    async fn delete_listing(
        &self,
        id: u64,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("listings/{id}")))
            .bearer_auth(token);
        self.execute(request, cancel).await?;
        Ok(())
    }

    async fn list_favorites(
        &self,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Listing>> {
        let request = self.client.get(self.url("favorites")).bearer_auth(token);
        self.execute_payload(request, cancel, "favorites").await
    }

    async fn add_favorite(&self, id: u64, token: &str, cancel: &CancellationToken) -> Result<()> {
        let request = self
            .client
            .post(self.url(&format!("favorites/{id}")))
            .bearer_auth(token);
        self.execute(request, cancel).await?;
        Ok(())
    }

    async fn remove_favorite(
        &self,
        id: u64,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<()> {
        let request = self
            .client
            .delete(self.url(&format!("favorites/{id}")))
            .bearer_auth(token);
        self.execute(request, cancel).await?;
        Ok(())
    }

    async fn send_chat(
        &self,
        request: &ChatRequest,
        cancel: &CancellationToken,
    ) -> Result<ChatReply> {
        let request = self.client.post(self.url("chatbot")).json(request);
        let envelope = self.execute(request, cancel).await?;
        let text = envelope
            .get("response")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let proposed_listing = envelope
            .get("proposed_listing")
            .filter(|v| !v.is_null())
            .cloned()
            .and_then(|v| serde_json::from_value(v).ok());
        Ok(ChatReply {
            text,
            proposed_listing,
        })
    }

    async fn upload_file(
        &self,
        bytes: &[u8],
        mime_type: &str,
        token: &str,
        cancel: &CancellationToken,
    ) -> Result<String> {
        let body = serde_json::json!({
            "file_base64": crate::attachment::encode_base64(bytes),
            "mime_type": mime_type,
        });
        let request = self
            .client
            .post(self.url("upload"))
            .bearer_auth(token)
            .json(&body);
        self.execute_payload(request, cancel, "url").await
    }
}
