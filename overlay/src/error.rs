//! Error types for the host layer.
//!
//! ERROR HANDLING
//! ==============
//! Collaborator failures propagate with `?` up to the controller entry point
//! that started the operation. The controller logs the error, hands its
//! message to the host notifier and returns it; nothing is retried.
//! Environment races (unmounted element, no canvas) never reach this module:
//! the engine treats them as no-ops.

#[cfg(test)]
#[path = "error_test.rs"]
mod error_test;

use panels::negotiation::NegotiationError;

/// Stable machine-readable code for an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

// =============================================================================
// COLLABORATOR ERRORS
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write setting {key}: {message}")]
    Write { key: String, message: String },
    #[error("setting {key} holds an unreadable value: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode setting {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl ErrorCode for StoreError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Write { .. } => "E_STORE_WRITE",
            Self::Decode { .. } => "E_STORE_DECODE",
            Self::Encode { .. } => "E_STORE_ENCODE",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Write { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SocketError {
    #[error("socket emit failed: {0}")]
    Emit(String),
}

#[derive(Debug, thiserror::Error)]
pub enum ResourceError {
    #[error("{resource} rejected the update: {message}")]
    Rejected { resource: &'static str, message: String },
}

#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to render {panel}: {message}")]
    Failed { panel: String, message: String },
}

// =============================================================================
// OVERLAY ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OverlayError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Socket(#[from] SocketError),
    #[error(transparent)]
    Resource(#[from] ResourceError),
    #[error(transparent)]
    Render(#[from] RenderError),
    #[error(transparent)]
    Negotiation(#[from] NegotiationError),
    #[error("{action} is restricted to the GM")]
    NotPermitted { action: String },
    #[error("no open panel with id {0}")]
    UnknownPanel(String),
    #[error("panel {panel} has no action {action}")]
    UnknownAction { panel: String, action: String },
    #[error("invalid payload for {action}: {message}")]
    InvalidPayload { action: String, message: String },
}

impl OverlayError {
    pub(crate) fn not_permitted(action: &str) -> Self {
        Self::NotPermitted { action: action.to_owned() }
    }

    pub(crate) fn invalid_payload(action: &str, message: impl Into<String>) -> Self {
        Self::InvalidPayload { action: action.to_owned(), message: message.into() }
    }
}

impl ErrorCode for OverlayError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Store(e) => e.error_code(),
            Self::Socket(_) => "E_SOCKET",
            Self::Resource(_) => "E_RESOURCE",
            Self::Render(_) => "E_RENDER",
            Self::Negotiation(_) => "E_NEGOTIATION",
            Self::NotPermitted { .. } => "E_NOT_PERMITTED",
            Self::UnknownPanel(_) => "E_UNKNOWN_PANEL",
            Self::UnknownAction { .. } => "E_UNKNOWN_ACTION",
            Self::InvalidPayload { .. } => "E_INVALID_PAYLOAD",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Store(e) => e.retryable(),
            _ => false,
        }
    }
}
