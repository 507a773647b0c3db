//! Interaction layer: HTTP client for the remote catalog/auth service.

pub mod attachment;
pub mod http_api;

pub use http_api::HttpCatalogApi;
