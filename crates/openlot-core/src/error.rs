//! Error types for the Openlot client core.

use thiserror::Error;

/// A shared error type for the Openlot state-synchronization layer.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait. The variants mirror the
/// failure taxonomy observed at the mutation boundary: transport failures,
/// server-side business rejections, cooperative cancellation, and the
/// auth-required short circuit that runs before any optimistic apply.
#[derive(Error, Debug, Clone)]
pub enum LotError {
    /// Network-level failure (unreachable, timeout, connection reset)
    #[error("Transport failure: {message}")]
    Transport { message: String },

    /// The server answered but rejected the operation (`success: false`)
    #[error("Request rejected: {message}")]
    Rejected { message: String },

    /// The operation was cancelled cooperatively (stop button, view teardown)
    #[error("Operation cancelled")]
    Cancelled,

    /// A mutation requiring an identity was attempted without one
    #[error("Authentication required")]
    AuthRequired,

    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Durable store error (profile key-value layer)
    #[error("Storage error: {message}")]
    Storage { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {message}")]
    Serialization { message: String },

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LotError {
    /// Creates a Transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport {
            message: message.into(),
        }
    }

    /// Creates a Rejected error carrying the server-supplied message
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::Rejected {
            message: message.into(),
        }
    }

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a cancellation
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }

    /// Check if this is the auth-required short circuit
    pub fn is_auth_required(&self) -> bool {
        matches!(self, Self::AuthRequired)
    }

    /// Check if this is a server-side business rejection
    pub fn is_rejected(&self) -> bool {
        matches!(self, Self::Rejected { .. })
    }

    /// The message to surface to the user for this failure.
    ///
    /// Business rejections carry the server-supplied text verbatim; transport
    /// failures collapse into one generic, retryable notice. Cancellations
    /// are reported as "stopped" by the caller and never reach this path
    /// as a failure message.
    pub fn user_message(&self) -> String {
        match self {
            Self::Rejected { message } => message.clone(),
            Self::Transport { .. } => "Something went wrong. Please try again.".to_string(),
            Self::AuthRequired => "Please sign in to continue.".to_string(),
            other => other.to_string(),
        }
    }
}

impl From<std::io::Error> for LotError {
    fn from(err: std::io::Error) -> Self {
        Self::Storage {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for LotError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (boundary with collaborator code)
impl From<anyhow::Error> for LotError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, LotError>`.
pub type Result<T> = std::result::Result<T, LotError>;
