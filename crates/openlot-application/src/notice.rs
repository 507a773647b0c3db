//! User-visible transient notices.
//!
//! Every failure caught at a controller boundary becomes a notice here;
//! nothing propagates to a crash handler. A failed favorite toggle or chat
//! turn must never take the rest of the view down with it.

use crate::mutation::MutationOutcome;
use chrono::{DateTime, Utc};
use std::collections::VecDeque;
use std::sync::Mutex;

const NOTICE_CAP: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Failure,
    /// Cooperative cancellation: distinct from failure, never styled as one
    Stopped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

/// Bounded in-memory queue of notices for the view to drain.
#[derive(Default)]
pub struct NoticeSink {
    entries: Mutex<VecDeque<Notice>>,
}

impl NoticeSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, kind: NoticeKind, message: impl Into<String>) {
        let mut entries = self.entries.lock().unwrap();
        if entries.len() == NOTICE_CAP {
            entries.pop_front();
        }
        entries.push_back(Notice {
            kind,
            message: message.into(),
            at: Utc::now(),
        });
    }

    pub fn info(&self, message: impl Into<String>) {
        self.push(NoticeKind::Info, message);
    }

    pub fn failure(&self, message: impl Into<String>) {
        self.push(NoticeKind::Failure, message);
    }

    pub fn stopped(&self, message: impl Into<String>) {
        self.push(NoticeKind::Stopped, message);
    }

    /// Surfaces the terminal outcome of a mutation. Confirmations are
    /// silent; rollbacks carry the message chosen by the controller.
    pub fn report(&self, outcome: &MutationOutcome) {
        match outcome {
            MutationOutcome::Confirmed => {}
            MutationOutcome::RolledBack { message } => self.failure(message.clone()),
            MutationOutcome::Stopped => self.stopped("Stopped."),
        }
    }

    pub fn latest(&self) -> Option<Notice> {
        self.entries.lock().unwrap().back().cloned()
    }

    /// Hands all pending notices to the view, clearing the queue.
    pub fn drain(&self) -> Vec<Notice> {
        self.entries.lock().unwrap().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn notices_are_bounded() {
        let sink = NoticeSink::new();
        for i in 0..NOTICE_CAP + 10 {
            sink.info(format!("notice {i}"));
        }
        let drained = sink.drain();
        assert_eq!(drained.len(), NOTICE_CAP);
        assert_eq!(drained[0].message, "notice 10");
    }

    #[test]
    fn rollback_reports_as_failure() {
        let sink = NoticeSink::new();
        sink.report(&MutationOutcome::RolledBack {
            message: "listing already sold".to_string(),
        });
        let latest = sink.latest().unwrap();
        assert_eq!(latest.kind, NoticeKind::Failure);
        assert_eq!(latest.message, "listing already sold");
    }

    #[test]
    fn confirmation_is_silent() {
        let sink = NoticeSink::new();
        sink.report(&MutationOutcome::Confirmed);
        assert!(sink.latest().is_none());
    }
}
