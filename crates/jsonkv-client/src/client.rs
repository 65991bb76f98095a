use std::collections::BTreeMap;
use std::sync::Arc;

use jsonkv_protocol::{Operation, RemoteConnection, Reply};
use jsonkv_types::{normalize, JsonType, Path, PathInput};
use serde_json::{Map, Number, Value};
use tracing::debug;

use crate::config::ClientConfig;
use crate::dispatcher::CommandDispatcher;
use crate::error::{ClientError, ClientResult};
use crate::materializer::AncestorMaterializer;
use crate::write::{SetOptions, WriteResult};

/// Typed access to a JSON document store.
///
/// Every method normalizes its path argument, sends one operation through
/// the [`CommandDispatcher`] (writes with auto-create may send more) and
/// interprets the normalized reply.
pub struct JsonClient {
    dispatcher: CommandDispatcher,
    config: ClientConfig,
}

impl JsonClient {
    pub fn new(connection: Arc<dyn RemoteConnection>) -> Self {
        Self::with_config(connection, ClientConfig::default())
    }

    pub fn with_config(connection: Arc<dyn RemoteConnection>, config: ClientConfig) -> Self {
        Self {
            dispatcher: CommandDispatcher::new(connection, config.classifier()),
            config,
        }
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn materializer(&self) -> AncestorMaterializer<'_> {
        AncestorMaterializer::new(&self.dispatcher)
    }

    /// Invoke an operation by wire name with raw arguments.
    pub async fn invoke(&self, name: &str, args: Vec<String>) -> ClientResult<Value> {
        self.dispatcher.invoke(name, args).await
    }

    // ---- Documents ----

    /// The value at `path`; `Null` when the key does not exist.
    pub async fn get(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<Value> {
        self.run(Operation::Get, key, path, vec![]).await
    }

    /// Several paths at once, as an object keyed by canonical path.
    ///
    /// `Null` when the key does not exist.
    pub async fn get_paths<I, P>(&self, key: &str, paths: I) -> ClientResult<Value>
    where
        I: IntoIterator<Item = P>,
        P: Into<PathInput>,
    {
        let paths: Vec<String> = paths.into_iter().map(|p| normalize(p).into_string()).collect();
        let mut args = vec![key.to_string()];
        args.extend(paths.iter().cloned());
        let value = self.dispatcher.invoke_op(Operation::Get, args).await?;

        // A single path comes back as the bare value.
        match (paths.as_slice(), value) {
            ([only], value) if !value.is_null() => {
                let mut map = Map::new();
                map.insert(only.clone(), value);
                Ok(Value::Object(map))
            }
            (_, value) => Ok(value),
        }
    }

    /// Write `value` at `path`, auto-creating per the client configuration.
    pub async fn set(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        value: Value,
    ) -> ClientResult<WriteResult> {
        let options = SetOptions::new().auto_create(self.config.auto_create);
        self.set_with(key, path, value, options).await
    }

    pub async fn set_with(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        value: Value,
        options: SetOptions,
    ) -> ClientResult<WriteResult> {
        let path = Path::from_input(path)?;
        self.materializer()
            .write_with_auto_create(key, &path, value, options)
            .await
    }

    /// Delete the value at `path`, or the whole document at the root.
    pub async fn del(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<i64> {
        let value = self.run(Operation::Del, key, path, vec![]).await?;
        count(Operation::Del, value)
    }

    /// The type of the value at `path`, `None` when absent.
    pub async fn type_of(
        &self,
        key: &str,
        path: impl Into<PathInput>,
    ) -> ClientResult<Option<JsonType>> {
        match self.run(Operation::Type, key, path, vec![]).await? {
            Value::Null => Ok(None),
            Value::String(name) => match name.parse() {
                Ok(kind) => Ok(Some(kind)),
                Err(_) => Err(unexpected(Operation::Type, Value::String(name))),
            },
            other => Err(unexpected(Operation::Type, other)),
        }
    }

    /// Read `path` from several documents.
    ///
    /// The result has one entry per requested key, `Null` where the key or
    /// path is missing. An element that is not valid JSON fails the whole
    /// call.
    pub async fn mget<I, K>(
        &self,
        keys: I,
        path: impl Into<PathInput>,
    ) -> ClientResult<BTreeMap<String, Value>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let keys: Vec<String> = keys.into_iter().map(Into::into).collect();
        let mut args = keys.clone();
        args.push(normalize(path).into_string());

        let items = match self.dispatcher.call(Operation::MGet, args).await? {
            Reply::Array(items) if items.len() == keys.len() => items,
            other => return Err(unexpected(Operation::MGet, other.into_plain_value())),
        };

        let mut out = BTreeMap::new();
        for (key, item) in keys.into_iter().zip(items) {
            let value = match item {
                Reply::Nil => Value::Null,
                Reply::Bulk(text) => serde_json::from_str(&text).map_err(|e| {
                    ClientError::MalformedReply {
                        key: key.clone(),
                        reason: e.to_string(),
                    }
                })?,
                Reply::Json(value) => value,
                other => return Err(unexpected(Operation::MGet, other.into_plain_value())),
            };
            out.insert(key, value);
        }
        debug!(keys = out.len(), "multi-key read");
        Ok(out)
    }

    // ---- Numbers ----

    pub async fn num_incr_by(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        by: impl Into<Number>,
    ) -> ClientResult<Value> {
        let by = by.into().to_string();
        self.run(Operation::NumIncrBy, key, path, vec![by]).await
    }

    pub async fn num_mult_by(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        by: impl Into<Number>,
    ) -> ClientResult<Value> {
        let by = by.into().to_string();
        self.run(Operation::NumMultBy, key, path, vec![by]).await
    }

    // ---- Strings ----

    /// Append to the string at `path`; returns the new length.
    pub async fn str_append(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        suffix: &str,
    ) -> ClientResult<i64> {
        let suffix = Value::from(suffix).to_string();
        let value = self.run(Operation::StrAppend, key, path, vec![suffix]).await?;
        count(Operation::StrAppend, value)
    }

    pub async fn str_len(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<Option<i64>> {
        let value = self.run(Operation::StrLen, key, path, vec![]).await?;
        optional_count(Operation::StrLen, value)
    }

    // ---- Arrays ----

    /// Append values; returns the new length.
    pub async fn arr_append<I>(&self, key: &str, path: impl Into<PathInput>, values: I) -> ClientResult<i64>
    where
        I: IntoIterator<Item = Value>,
    {
        let values: Vec<String> = values.into_iter().map(|v| v.to_string()).collect();
        let value = self.run(Operation::ArrAppend, key, path, values).await?;
        count(Operation::ArrAppend, value)
    }

    /// Position of the first element equal to `needle` within
    /// `start..stop` (`stop == 0` means the end; negatives count from it).
    pub async fn arr_index(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        needle: &Value,
        start: i64,
        stop: i64,
    ) -> ClientResult<Option<usize>> {
        let args = vec![needle.to_string(), start.to_string(), stop.to_string()];
        let value = self.run(Operation::ArrIndex, key, path, args).await?;
        let index = count(Operation::ArrIndex, value)?;
        Ok(usize::try_from(index).ok())
    }

    /// Insert values before `index`; returns the new length.
    pub async fn arr_insert<I>(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        index: i64,
        values: I,
    ) -> ClientResult<i64>
    where
        I: IntoIterator<Item = Value>,
    {
        let args: Vec<String> = std::iter::once(index.to_string())
            .chain(values.into_iter().map(|v| v.to_string()))
            .collect();
        let value = self.run(Operation::ArrInsert, key, path, args).await?;
        count(Operation::ArrInsert, value)
    }

    pub async fn arr_len(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<Option<i64>> {
        let value = self.run(Operation::ArrLen, key, path, vec![]).await?;
        optional_count(Operation::ArrLen, value)
    }

    /// Remove and return the element at `index` (default last); `Null` for
    /// an empty array.
    pub async fn arr_pop(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        index: Option<i64>,
    ) -> ClientResult<Value> {
        let args: Vec<String> = index.map(|i| i.to_string()).into_iter().collect();
        self.run(Operation::ArrPop, key, path, args).await
    }

    /// Keep only `start..=stop`; returns the new length.
    pub async fn arr_trim(
        &self,
        key: &str,
        path: impl Into<PathInput>,
        start: i64,
        stop: i64,
    ) -> ClientResult<i64> {
        let value = self
            .run(Operation::ArrTrim, key, path, vec![start.to_string(), stop.to_string()])
            .await?;
        count(Operation::ArrTrim, value)
    }

    // ---- Objects ----

    pub async fn obj_keys(
        &self,
        key: &str,
        path: impl Into<PathInput>,
    ) -> ClientResult<Option<Vec<String>>> {
        match self.run(Operation::ObjKeys, key, path, vec![]).await? {
            Value::Null => Ok(None),
            Value::Array(items) => items
                .into_iter()
                .map(|item| match item {
                    Value::String(s) => Ok(s),
                    other => Err(unexpected(Operation::ObjKeys, other)),
                })
                .collect::<ClientResult<Vec<_>>>()
                .map(Some),
            other => Err(unexpected(Operation::ObjKeys, other)),
        }
    }

    pub async fn obj_len(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<Option<i64>> {
        let value = self.run(Operation::ObjLen, key, path, vec![]).await?;
        optional_count(Operation::ObjLen, value)
    }

    // ---- Introspection ----

    /// Size in bytes the store reports for the value at `path`.
    pub async fn debug_memory(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<i64> {
        let args = vec!["MEMORY".to_string(), key.to_string(), normalize(path).into_string()];
        let value = self.dispatcher.invoke_op(Operation::Debug, args).await?;
        count(Operation::Debug, value)
    }

    /// The value at `path` in the store's protocol representation.
    pub async fn resp(&self, key: &str, path: impl Into<PathInput>) -> ClientResult<Value> {
        self.run(Operation::Resp, key, path, vec![]).await
    }

    /// `operation key <path> extra...`
    async fn run(
        &self,
        operation: Operation,
        key: &str,
        path: impl Into<PathInput>,
        extra: Vec<String>,
    ) -> ClientResult<Value> {
        let mut args = vec![key.to_string(), normalize(path).into_string()];
        args.extend(extra);
        self.dispatcher.invoke_op(operation, args).await
    }
}

impl std::fmt::Debug for JsonClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JsonClient")
            .field("dispatcher", &self.dispatcher)
            .field("auto_create", &self.config.auto_create)
            .finish()
    }
}

fn unexpected(operation: Operation, reply: Value) -> ClientError {
    ClientError::UnexpectedReply { operation, reply }
}

fn count(operation: Operation, value: Value) -> ClientResult<i64> {
    value.as_i64().ok_or_else(|| unexpected(operation, value))
}

fn optional_count(operation: Operation, value: Value) -> ClientResult<Option<i64>> {
    match value {
        Value::Null => Ok(None),
        other => count(operation, other).map(Some),
    }
}
