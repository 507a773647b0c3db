//! Chat transcript domain: sessions, messages, history capping.

pub mod model;

pub use model::{
    AttachmentRef, ChatMessage, ChatSession, DEFAULT_SESSION_TITLE, ProposedListing, Role,
    SESSION_MESSAGE_CAP, TITLE_MAX_LEN,
};
