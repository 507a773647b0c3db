//! Chat session store.
//!
//! Multi-session transcript manager scoped to the authenticated identity.
//! Every mutation persists the whole session list to the durable store,
//! truncating each transcript to the cap as it goes. Sending is two-phase:
//! the user's message lands and persists immediately, then the assistant
//! request goes out carrying the truncated history; a new send or an
//! explicit stop cancels the in-flight request without corrupting the
//! transcript.
//!
//! Switching identity swaps the entire session list and active pointer for
//! the identity-scoped store key. Anonymous visitors have no chat store;
//! every operation short-circuits with the auth-required error before any
//! state changes.

use crate::notice::NoticeSink;
use openlot_core::api::{CatalogApi, ChatRequest, ChatTurn};
use openlot_core::chat::{AttachmentRef, ChatMessage, ChatSession};
use openlot_core::error::{LotError, Result};
use openlot_core::store::{ProfileStore, ProfileStoreExt, StoreKey, StoreNamespace};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use tokio_util::sync::CancellationToken;

/// Terminal outcome of one send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    /// The assistant replied and the transcript was persisted
    Replied,
    /// The request was cancelled; the user's message stands, no assistant
    /// message was appended
    Stopped,
    /// The request failed; a notice was surfaced, no placeholder message
    /// was inserted
    Failed,
}

/// Shape persisted under the ChatSessions namespace.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct PersistedSessions {
    sessions: Vec<ChatSession>,
    active: Option<String>,
}

#[derive(Default)]
struct ChatState {
    /// Identity the loaded sessions belong to; `None` while anonymous
    identity: Option<String>,
    sessions: Vec<ChatSession>,
    active: Option<String>,
}

/// The single in-flight assistant request.
///
/// Each send gets a sequence number alongside its token; a finished send
/// only releases the slot while its own sequence is still current, so it
/// can never wipe the token of a newer send that replaced it.
#[derive(Default)]
struct InflightSlot {
    next_seq: u64,
    current: Option<(u64, CancellationToken)>,
}

impl InflightSlot {
    /// Installs a fresh token, cancelling the send it replaces.
    fn begin(&mut self) -> (u64, CancellationToken) {
        self.next_seq += 1;
        let token = CancellationToken::new();
        if let Some((_, previous)) = self.current.replace((self.next_seq, token.clone())) {
            previous.cancel();
        }
        (self.next_seq, token)
    }

    /// Releases the slot if `seq` is still the occupant.
    fn finish(&mut self, seq: u64) {
        if self.current.as_ref().is_some_and(|(s, _)| *s == seq) {
            self.current = None;
        }
    }

    fn take(&mut self) -> Option<CancellationToken> {
        self.current.take().map(|(_, token)| token)
    }
}

pub struct ChatStore {
    api: Arc<dyn CatalogApi>,
    store: Arc<dyn ProfileStore>,
    notices: Arc<NoticeSink>,
    state: Mutex<ChatState>,
    inflight: Mutex<InflightSlot>,
}

impl ChatStore {
    pub fn new(
        api: Arc<dyn CatalogApi>,
        store: Arc<dyn ProfileStore>,
        notices: Arc<NoticeSink>,
    ) -> Self {
        Self {
            api,
            store,
            notices,
            state: Mutex::new(ChatState::default()),
            inflight: Mutex::new(InflightSlot::default()),
        }
    }

    /// Swaps the entire session list for the new identity.
    ///
    /// Sessions are never merged across identities: the previous list is
    /// dropped wholesale (its persisted copy stays under its own key) and
    /// the new identity's list is loaded from its scoped key. Any in-flight
    /// assistant request is cancelled first.
    pub fn switch_identity(&self, identity: Option<&str>) {
        self.stop();
        let mut state = self.state.lock().unwrap();
        if state.identity.as_deref() == identity {
            return;
        }
        match identity {
            Some(identity) => {
                let persisted: PersistedSessions = self
                    .store
                    .read(&StoreKey::scoped(StoreNamespace::ChatSessions, identity));
                let mut sessions = persisted.sessions;
                sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
                tracing::debug!(identity, count = sessions.len(), "loaded chat sessions");
                state.identity = Some(identity.to_string());
                state.sessions = sessions;
                state.active = persisted.active;
            }
            None => {
                *state = ChatState::default();
            }
        }
    }

    /// Creates an empty session and makes it active.
    pub fn create_session(&self) -> Result<String> {
        let mut state = self.state.lock().unwrap();
        require_identity(&state)?;
        let session = ChatSession::new();
        let id = session.id.clone();
        state.sessions.insert(0, session);
        state.active = Some(id.clone());
        self.persist_locked(&mut state)?;
        Ok(id)
    }

    /// Deletes a session, moving the active pointer off it if needed.
    pub fn delete_session(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        require_identity(&state)?;
        state.sessions.retain(|s| s.id != id);
        if state.active.as_deref() == Some(id) {
            state.active = state.sessions.first().map(|s| s.id.clone());
        }
        self.persist_locked(&mut state)
    }

    /// Sessions ordered most-recently-updated first.
    pub fn list_sessions(&self) -> Vec<ChatSession> {
        self.state.lock().unwrap().sessions.clone()
    }

    pub fn set_active(&self, id: &str) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        require_identity(&state)?;
        if !state.sessions.iter().any(|s| s.id == id) {
            return Err(LotError::not_found("session", id));
        }
        state.active = Some(id.to_string());
        self.persist_locked(&mut state)
    }

    pub fn active_session(&self) -> Option<ChatSession> {
        let state = self.state.lock().unwrap();
        let id = state.active.as_deref()?;
        state.sessions.iter().find(|s| s.id == id).cloned()
    }

    /// Sends a user message in a session and awaits the assistant reply.
    ///
    /// Phase one appends the user's message (adopting the session title on
    /// first use) and persists synchronously. Phase two issues the
    /// cancellable assistant request carrying the truncated history. A
    /// concurrent send cancels the previous in-flight request.
    pub async fn send(
        &self,
        session_id: &str,
        text: &str,
        attachment: Option<OutgoingAttachment>,
    ) -> Result<SendOutcome> {
        // Phase one: the user's message is observable and durable before
        // any network call.
        let history = {
            let mut state = self.state.lock().unwrap();
            require_identity(&state)?;
            let session = state
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| LotError::not_found("session", session_id.to_string()))?;

            let mut message = ChatMessage::user(text);
            if let Some(attachment) = &attachment {
                message = message.with_attachment(AttachmentRef {
                    url: attachment.url.clone(),
                    mime_type: Some(attachment.mime_type.clone()),
                });
            }
            session.adopt_title(text);
            session.push(message);
            session.truncate_to_cap();
            let history: Vec<ChatTurn> = session
                .messages
                .iter()
                .map(|m| ChatTurn {
                    role: m.role,
                    text: m.text.clone(),
                })
                .collect();
            self.persist_locked(&mut state)?;
            history
        };

        // Phase two: the cancellable assistant request. A newer send takes
        // over the in-flight slot and cancels this one.
        let (seq, cancel) = self.inflight.lock().unwrap().begin();

        let request = ChatRequest {
            query: text.to_string(),
            history,
            image_base64: attachment.as_ref().map(|a| a.base64.clone()),
            image_mime_type: attachment.map(|a| a.mime_type),
        };
        let result = self.api.send_chat(&request, &cancel).await;

        // Release the slot; a newer occupant is left alone.
        self.inflight.lock().unwrap().finish(seq);

        match result {
            Ok(reply) => {
                let mut state = self.state.lock().unwrap();
                let Some(session) = state.sessions.iter_mut().find(|s| s.id == session_id)
                else {
                    // Session deleted or identity switched while in flight:
                    // the reply has nowhere to land, discard it.
                    tracing::debug!(session_id, "discarding reply for missing session");
                    return Ok(SendOutcome::Stopped);
                };
                let mut message = ChatMessage::assistant(reply.text);
                if let Some(proposed) = reply.proposed_listing {
                    message = message.with_proposed_listing(proposed);
                }
                session.push(message);
                self.persist_locked(&mut state)?;
                Ok(SendOutcome::Replied)
            }
            Err(LotError::Cancelled) => {
                self.notices.stopped("Response stopped.");
                Ok(SendOutcome::Stopped)
            }
            Err(err) => {
                self.notices.failure(err.user_message());
                Ok(SendOutcome::Failed)
            }
        }
    }

    /// Cancels the in-flight assistant request, if any.
    pub fn stop(&self) {
        if let Some(token) = self.inflight.lock().unwrap().take() {
            token.cancel();
        }
    }

    /// Whether an assistant request is currently in flight.
    pub fn is_sending(&self) -> bool {
        self.inflight.lock().unwrap().current.is_some()
    }

    /// Persists the whole session list for the current identity, capping
    /// every transcript and keeping most-recently-updated order.
    fn persist_locked(&self, state: &mut ChatState) -> Result<()> {
        let Some(identity) = state.identity.clone() else {
            return Err(LotError::AuthRequired);
        };
        for session in &mut state.sessions {
            session.truncate_to_cap();
        }
        state.sessions.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        let persisted = PersistedSessions {
            sessions: state.sessions.clone(),
            active: state.active.clone(),
        };
        self.store.write(
            &StoreKey::scoped(StoreNamespace::ChatSessions, identity),
            &persisted,
        )
    }
}

fn require_identity(state: &ChatState) -> Result<()> {
    if state.identity.is_none() {
        return Err(LotError::AuthRequired);
    }
    Ok(())
}

/// An attachment going out with a chat message: the uploaded URL for the
/// transcript plus the inline payload for the assistant.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingAttachment {
    pub url: String,
    pub base64: String,
    pub mime_type: String,
}
