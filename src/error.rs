//! Error taxonomy for the approval workflow.
use crate::document::DocumentKind;

/// Aggregate-level invariant violations found on a document snapshot.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    #[error("line item {item_code} has a non-positive quantity")]
    NonPositiveQuantity { item_code: String },
    #[error("line item {item_code} carries a negative price")]
    NegativePrice { item_code: String },
    #[error("line item {item_code} does not belong to a {kind}")]
    ForeignLineItem {
        kind: DocumentKind,
        item_code: String,
    },
}

/// Failures of a single transition attempt. These are local, typed results;
/// none of them is retryable.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum TransitionError {
    #[error("actor is not permitted to {action} a {kind}")]
    Unauthorized {
        kind: DocumentKind,
        action: &'static str,
    },
    #[error("cannot {action} a {kind} in status {status}")]
    InvalidTransition {
        kind: DocumentKind,
        action: &'static str,
        status: &'static str,
    },
    #[error("missing or invalid field: {field}")]
    Validation { field: &'static str },
    #[error(transparent)]
    Document(#[from] DocumentError),
}

/// Failures talking to the remote persistence API.
#[derive(thiserror::Error, Debug)]
pub enum ApiError {
    #[error("transport failure: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("api rejected the request: {0}")]
    Rejected(String),
    #[error("malformed response: {0}")]
    MalformedResponse(String),
}

impl ApiError {
    /// Only transport-level failures are worth retrying; the server's
    /// rejections are final until the caller changes the request.
    pub fn is_transient(&self) -> bool {
        match self {
            ApiError::Transport(err) => err.is_timeout() || err.is_connect(),
            _ => false,
        }
    }
}

/// Orchestrator-level failure surface.
#[derive(thiserror::Error, Debug)]
pub enum WorkflowError {
    #[error(transparent)]
    Transition(#[from] TransitionError),
    #[error("persistence call failed: {0}")]
    Persistence(#[from] ApiError),
    #[error("snapshot cache failure: {0}")]
    Cache(#[from] sled::Error),
    #[error("cached snapshot is corrupt: {0}")]
    CorruptCache(#[from] serde_json::Error),
}
