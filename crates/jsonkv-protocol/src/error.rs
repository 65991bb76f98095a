use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProtocolError {
    /// The store executed the call and answered with an error reply.
    #[error("remote error: {0}")]
    Remote(String),

    /// The call never produced a reply.
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProtocolError {
    /// Raw text of the failure, as used for classification.
    pub fn message(&self) -> String {
        match self {
            Self::Remote(message) | Self::Transport(message) => message.clone(),
        }
    }
}

pub type ProtocolResult<T> = Result<T, ProtocolError>;
