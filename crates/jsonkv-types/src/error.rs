use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid path {path:?}: {reason}")]
    InvalidPath { path: String, reason: String },

    #[error("unknown JSON type name: {0}")]
    UnknownType(String),
}

pub type TypeResult<T> = Result<T, TypeError>;
