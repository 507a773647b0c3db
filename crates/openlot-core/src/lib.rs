pub mod api;
pub mod auth;
pub mod catalog;
pub mod chat;
pub mod currency;
pub mod error;
pub mod favorite;
pub mod listing;
pub mod store;

// Re-export common error type
pub use error::{LotError, Result};
