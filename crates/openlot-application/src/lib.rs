//! Application layer: the stateful controllers of the marketplace client.
//!
//! Each component owns an explicit state container with a narrow mutation
//! API; there are no ambient mutable globals. All remote effects funnel
//! through the [`openlot_core::api::CatalogApi`] collaborator and every
//! failure is converted into a user-visible notice at this boundary.

pub mod browse;
pub mod chat;
pub mod favorites;
pub mod mutation;
pub mod notice;

pub use browse::BrowseService;
pub use chat::{ChatStore, SendOutcome};
pub use favorites::FavoritesService;
pub use mutation::{MutationOutcome, OptimisticMutation};
pub use notice::{Notice, NoticeKind, NoticeSink};
