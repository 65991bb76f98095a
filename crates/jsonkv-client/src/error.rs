use jsonkv_protocol::{FailureCategory, Operation};
use jsonkv_types::TypeError;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),

    /// The store answered with an error reply.
    #[error("remote failure ({category}): {message}")]
    RemoteFailure {
        category: FailureCategory,
        message: String,
    },

    /// The connection failed before the store could answer.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected reply to {operation}: {reply}")]
    UnexpectedReply { operation: Operation, reply: Value },

    #[error("malformed reply for key {key}: {reason}")]
    MalformedReply { key: String, reason: String },

    #[error("invalid path: {0}")]
    Path(#[from] TypeError),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ClientError {
    /// The failure category, for errors the store reported.
    pub fn category(&self) -> Option<FailureCategory> {
        match self {
            Self::RemoteFailure { category, .. } => Some(*category),
            _ => None,
        }
    }

    /// Whether a failed write may be retried by materializing ancestors.
    pub fn allows_auto_create(&self) -> bool {
        self.category().is_some_and(|c| c.allows_auto_create())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
