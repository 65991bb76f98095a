//! Wire protocol for jsonkv.
//!
//! Defines the fixed set of remote operations, the invocation handles bound
//! to them, the reply shapes a connection produces and how they normalize
//! into JSON values, and the classification of error replies.

pub mod condition;
pub mod connection;
pub mod error;
pub mod failure;
pub mod operation;
pub mod reply;

pub use condition::SetCondition;
pub use connection::RemoteConnection;
pub use error::{ProtocolError, ProtocolResult};
pub use failure::{messages, FailureCategory, FailureClassifier, TriggerPattern};
pub use operation::{Operation, OperationHandle};
pub use reply::{decode_text, Reply};
