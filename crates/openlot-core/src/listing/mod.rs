//! Vehicle listing domain: the record model and the pure query pipeline.

pub mod model;
pub mod query;

pub use model::{Listing, ListingDraft, MediaRef, Specs};
pub use query::{PAGE_SIZE, QueryFilter, QueryPage, SortKey, apply, select, slice};
