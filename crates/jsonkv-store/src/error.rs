use jsonkv_protocol::{messages, ProtocolError};
use jsonkv_types::{JsonType, TypeError};

/// Errors from executing a command against a stored document.
///
/// The display text is the error reply the store sends back, so it must
/// keep the wording clients classify on.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("ERR wrong number of arguments for '{0}' command")]
    WrongArity(&'static str),

    #[error("ERR syntax error")]
    Syntax,

    #[error("ERR invalid path: {0}")]
    InvalidPath(#[from] TypeError),

    #[error("ERR invalid JSON: {0}")]
    InvalidJson(String),

    #[error("ERR {}", messages::MUST_CREATE_AT_ROOT)]
    MustCreateAtRoot,

    #[error("ERR {}", messages::MISSING_INTERMEDIATE)]
    MissingIntermediate,

    /// The first segment of a deeper path is missing.
    #[error("ERR key '{0}' does not exist at level 0 in path")]
    MissingAtRootLevel(String),

    #[error("ERR Path '{0}' does not exist")]
    PathMissing(String),

    #[error("ERR could not perform this operation on a key that doesn't exist")]
    KeyMissing,

    #[error("ERR wrong type of path value - expected {expected} but found {found}")]
    WrongType { expected: &'static str, found: JsonType },

    #[error("ERR index out of range")]
    IndexOutOfRange,

    #[error("ERR expected a number but found '{0}'")]
    NotANumber(String),

    #[error("ERR result is not a finite number")]
    NotFinite,

    #[error("ERR unknown subcommand '{0}'")]
    UnknownSubcommand(String),

    /// A failure queued through `InMemoryJsonStore::fail_next`.
    #[error("{0}")]
    Injected(String),
}

impl From<StoreError> for ProtocolError {
    fn from(err: StoreError) -> Self {
        ProtocolError::Remote(err.to_string())
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;
    use jsonkv_protocol::{FailureCategory, FailureClassifier};

    #[test]
    fn wording_matches_default_triggers() {
        let c = FailureClassifier::default();
        assert_eq!(
            c.classify(&StoreError::MustCreateAtRoot.to_string()),
            FailureCategory::MustCreateAtRoot
        );
        assert_eq!(
            c.classify(&StoreError::MissingIntermediate.to_string()),
            FailureCategory::MissingIntermediateAncestor
        );
        assert_eq!(
            c.classify(&StoreError::MissingAtRootLevel("a".into()).to_string()),
            FailureCategory::FailureAtPathDepthZero
        );
        assert_eq!(
            c.classify(&StoreError::IndexOutOfRange.to_string()),
            FailureCategory::Other
        );
    }

    #[test]
    fn converts_to_remote_error() {
        let err: ProtocolError = StoreError::WrongType {
            expected: "object",
            found: JsonType::Integer,
        }
        .into();
        assert_eq!(
            err.message(),
            "ERR wrong type of path value - expected object but found integer"
        );
    }
}
