//! Chat session domain model.
//!
//! A session is a bounded transcript scoped to one authenticated identity.
//! History is capped on every persist (oldest dropped first), and a
//! session adopts its title from the first user message exactly once.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum number of messages retained per session.
pub const SESSION_MESSAGE_CAP: usize = 40;

/// Maximum length of a title adopted from the first user message, in chars.
pub const TITLE_MAX_LEN: usize = 40;

/// Placeholder title of a freshly created session.
pub const DEFAULT_SESSION_TITLE: &str = "New chat";

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// Reference to an uploaded attachment shown alongside a message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttachmentRef {
    pub url: String,
    #[serde(default)]
    pub mime_type: Option<String>,
}

/// Structured listing draft proposed by the assistant.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProposedListing {
    #[serde(default)]
    pub make: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub year: Option<u32>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub description: Option<String>,
}

/// One transcript entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub text: String,
    pub sent_at: DateTime<Utc>,
    #[serde(default)]
    pub attachment: Option<AttachmentRef>,
    #[serde(default)]
    pub proposed_listing: Option<ProposedListing>,
}

impl ChatMessage {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sent_at: Utc::now(),
            attachment: None,
            proposed_listing: None,
        }
    }

    pub fn assistant(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            text: text.into(),
            sent_at: Utc::now(),
            attachment: None,
            proposed_listing: None,
        }
    }

    pub fn with_attachment(mut self, attachment: AttachmentRef) -> Self {
        self.attachment = Some(attachment);
        self
    }

    pub fn with_proposed_listing(mut self, proposed: ProposedListing) -> Self {
        self.proposed_listing = Some(proposed);
        self
    }
}

/// A bounded, per-identity chat transcript.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatSession {
    /// Unique session identifier (UUID format)
    pub id: String,
    pub title: String,
    pub messages: Vec<ChatMessage>,
    pub updated_at: DateTime<Utc>,
}

impl ChatSession {
    /// Creates an empty session with the placeholder title.
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            title: DEFAULT_SESSION_TITLE.to_string(),
            messages: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    /// Appends a message and bumps the updated timestamp.
    pub fn push(&mut self, message: ChatMessage) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }

    /// Drops oldest messages until the transcript fits the cap.
    ///
    /// Runs on every persist, not only on read.
    pub fn truncate_to_cap(&mut self) {
        if self.messages.len() > SESSION_MESSAGE_CAP {
            let excess = self.messages.len() - SESSION_MESSAGE_CAP;
            self.messages.drain(..excess);
        }
    }

    /// Whether the title is still the creation placeholder.
    pub fn has_placeholder_title(&self) -> bool {
        self.title == DEFAULT_SESSION_TITLE
    }

    /// Adopts `text` as the title if the placeholder is still in place.
    ///
    /// Happens exactly once per session: subsequent calls are no-ops.
    pub fn adopt_title(&mut self, text: &str) {
        if !self.has_placeholder_title() {
            return;
        }
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return;
        }
        self.title = trimmed.chars().take(TITLE_MAX_LEN).collect();
    }
}

impl Default for ChatSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cap_keeps_newest_messages_oldest_first() {
        let mut session = ChatSession::new();
        for i in 0..SESSION_MESSAGE_CAP + 5 {
            session.push(ChatMessage::user(format!("msg {i}")));
        }
        session.truncate_to_cap();

        assert_eq!(session.messages.len(), SESSION_MESSAGE_CAP);
        assert_eq!(session.messages[0].text, "msg 5");
        assert_eq!(
            session.messages.last().unwrap().text,
            format!("msg {}", SESSION_MESSAGE_CAP + 4)
        );
    }

    #[test]
    fn title_is_adopted_exactly_once() {
        let mut session = ChatSession::new();
        session.adopt_title("How much is my Civic worth?");
        assert_eq!(session.title, "How much is my Civic worth?");

        session.adopt_title("second message");
        assert_eq!(session.title, "How much is my Civic worth?");
    }

    #[test]
    fn adopted_title_is_bounded() {
        let mut session = ChatSession::new();
        let long = "x".repeat(200);
        session.adopt_title(&long);
        assert_eq!(session.title.chars().count(), TITLE_MAX_LEN);
    }

    #[test]
    fn blank_text_does_not_consume_the_placeholder() {
        let mut session = ChatSession::new();
        session.adopt_title("   ");
        assert!(session.has_placeholder_title());
    }
}
