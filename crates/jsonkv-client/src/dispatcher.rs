//! Command dispatch.
//!
//! [`CommandDispatcher`] is the single path every remote call takes: it
//! resolves the operation, reuses (or lazily binds) the operation's
//! invocation handle, issues the call once, and turns the outcome into a
//! normalized JSON value or a classified [`ClientError`].

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use jsonkv_protocol::{
    FailureClassifier, Operation, OperationHandle, ProtocolError, RemoteConnection, Reply,
};
use serde_json::Value;
use tracing::debug;

use crate::error::{ClientError, ClientResult};

pub struct CommandDispatcher {
    connection: Arc<dyn RemoteConnection>,
    classifier: FailureClassifier,
    /// At most one handle per operation; entries are never removed.
    handles: RwLock<HashMap<Operation, OperationHandle>>,
}

impl CommandDispatcher {
    pub fn new(connection: Arc<dyn RemoteConnection>, classifier: FailureClassifier) -> Self {
        Self {
            connection,
            classifier,
            handles: RwLock::new(HashMap::new()),
        }
    }

    pub fn classifier(&self) -> &FailureClassifier {
        &self.classifier
    }

    /// Number of operations bound so far.
    pub fn handle_count(&self) -> usize {
        self.handles.read().map(|h| h.len()).unwrap_or(0)
    }

    /// Operations bound so far, sorted.
    pub fn bound_operations(&self) -> Vec<Operation> {
        let mut ops: Vec<Operation> = self
            .handles
            .read()
            .map(|h| h.keys().copied().collect())
            .unwrap_or_default();
        ops.sort();
        ops
    }

    /// Invoke an operation by wire name.
    ///
    /// Unknown names fail with [`ClientError::UnsupportedOperation`] before
    /// anything is sent.
    pub async fn invoke(&self, name: &str, args: Vec<String>) -> ClientResult<Value> {
        let operation = Operation::from_name(name)
            .ok_or_else(|| ClientError::UnsupportedOperation(name.to_string()))?;
        self.invoke_op(operation, args).await
    }

    /// Invoke `operation` and normalize the reply into a JSON value.
    pub async fn invoke_op(&self, operation: Operation, args: Vec<String>) -> ClientResult<Value> {
        self.call(operation, args).await.map(Reply::into_value)
    }

    /// Invoke `operation` and return the reply as received.
    pub async fn call(&self, operation: Operation, args: Vec<String>) -> ClientResult<Reply> {
        let handle = self.handle(operation)?;
        debug!(operation = %operation, args = args.len(), "dispatching");
        match self.connection.call(&handle, &args).await {
            Ok(reply) => Ok(reply),
            Err(ProtocolError::Remote(message)) => {
                let category = self.classifier.classify(&message);
                debug!(operation = %operation, %category, %message, "remote failure");
                Err(ClientError::RemoteFailure { category, message })
            }
            Err(other) => Err(ClientError::Transport(other.message())),
        }
    }

    fn handle(&self, operation: Operation) -> ClientResult<OperationHandle> {
        if let Some(handle) = self.handles.read().map_err(poisoned)?.get(&operation) {
            return Ok(handle.clone());
        }
        let mut handles = self.handles.write().map_err(poisoned)?;
        let handle = handles.entry(operation).or_insert_with(|| {
            debug!(operation = %operation, "binding invocation handle");
            self.connection.bind(operation)
        });
        Ok(handle.clone())
    }
}

impl std::fmt::Debug for CommandDispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandDispatcher")
            .field("classifier", &self.classifier)
            .field("handles", &self.handle_count())
            .finish()
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> ClientError {
    ClientError::Internal("lock poisoned".into())
}
