use async_trait::async_trait;

use crate::error::ProtocolResult;
use crate::operation::{Operation, OperationHandle};
use crate::reply::Reply;

/// A connection to a store that accepts the fixed operation set.
///
/// Establishing the connection is the implementor's concern. Each `call`
/// completes at most once: one reply or one error, no retries.
#[async_trait]
pub trait RemoteConnection: Send + Sync {
    /// Create the invocation handle for `operation`.
    ///
    /// Must be idempotent: binding the same operation twice yields
    /// equivalent handles.
    fn bind(&self, operation: Operation) -> OperationHandle {
        OperationHandle::new(operation)
    }

    /// Issue one call with positional arguments.
    async fn call(&self, handle: &OperationHandle, args: &[String]) -> ProtocolResult<Reply>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProtocolError;

    struct Echo;

    #[async_trait]
    impl RemoteConnection for Echo {
        async fn call(&self, handle: &OperationHandle, args: &[String]) -> ProtocolResult<Reply> {
            if args.is_empty() {
                return Err(ProtocolError::Remote(format!(
                    "ERR wrong number of arguments for '{}' command",
                    handle.command()
                )));
            }
            Ok(Reply::Array(args.iter().cloned().map(Reply::Bulk).collect()))
        }
    }

    #[tokio::test]
    async fn default_bind_is_idempotent() {
        let conn = Echo;
        assert_eq!(conn.bind(Operation::Get), conn.bind(Operation::Get));
        assert_ne!(conn.bind(Operation::Get), conn.bind(Operation::Set));
    }

    #[tokio::test]
    async fn call_through_trait_object() {
        let conn: Box<dyn RemoteConnection> = Box::new(Echo);
        let handle = conn.bind(Operation::Get);
        let reply = conn.call(&handle, &["k".into()]).await.unwrap();
        assert_eq!(reply, Reply::Array(vec![Reply::Bulk("k".into())]));

        let err = conn.call(&handle, &[]).await.unwrap_err();
        assert!(err.message().contains("JSON.GET"));
    }
}
