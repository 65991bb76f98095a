//! In-memory document store for testing and ephemeral use.
//!
//! [`InMemoryJsonStore`] keeps one JSON document per key in a `HashMap`
//! protected by a `RwLock` and answers the full operation set through
//! [`RemoteConnection`], producing the same reply shapes and error wording
//! as the remote store. Every call is recorded so tests can assert on the
//! exact sequence of remote calls a client issued.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use jsonkv_protocol::{
    Operation, OperationHandle, ProtocolResult, RemoteConnection, Reply, SetCondition,
};
use jsonkv_types::{JsonType, Path};
use serde_json::{Number, Value};
use tracing::trace;

use crate::document;
use crate::error::{StoreError, StoreResult};

/// One call received by the store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordedCall {
    pub operation: Operation,
    pub args: Vec<String>,
}

/// An in-memory implementation of [`RemoteConnection`].
///
/// Data is lost when the store is dropped. Each call yields to the runtime
/// once before executing, so concurrent callers interleave between calls
/// the way they would against a remote store.
pub struct InMemoryJsonStore {
    documents: RwLock<HashMap<String, Value>>,
    calls: RwLock<Vec<RecordedCall>>,
    injected: RwLock<Vec<(Operation, String)>>,
}

impl InMemoryJsonStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self {
            documents: RwLock::new(HashMap::new()),
            calls: RwLock::new(Vec::new()),
            injected: RwLock::new(Vec::new()),
        }
    }

    /// Store `value` as the whole document under `key`.
    pub fn insert(&self, key: impl Into<String>, value: Value) {
        self.documents
            .write()
            .expect("lock poisoned")
            .insert(key.into(), value);
    }

    /// A copy of the document under `key`.
    pub fn document(&self, key: &str) -> Option<Value> {
        self.documents.read().expect("lock poisoned").get(key).cloned()
    }

    /// Sorted list of all keys.
    pub fn keys(&self) -> Vec<String> {
        let docs = self.documents.read().expect("lock poisoned");
        let mut keys: Vec<String> = docs.keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Number of documents currently stored.
    pub fn len(&self) -> usize {
        self.documents.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the store holds no documents.
    pub fn is_empty(&self) -> bool {
        self.documents.read().expect("lock poisoned").is_empty()
    }

    /// Every call received so far, oldest first.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.read().expect("lock poisoned").clone()
    }

    /// Number of calls received for `operation`.
    pub fn call_count(&self, operation: Operation) -> usize {
        self.calls
            .read()
            .expect("lock poisoned")
            .iter()
            .filter(|c| c.operation == operation)
            .count()
    }

    pub fn clear_calls(&self) {
        self.calls.write().expect("lock poisoned").clear();
    }

    /// Make the next call of `operation` fail with `message` verbatim.
    pub fn fail_next(&self, operation: Operation, message: impl Into<String>) {
        self.injected
            .write()
            .expect("lock poisoned")
            .push((operation, message.into()));
    }

    fn take_injected(&self, operation: Operation) -> Option<String> {
        let mut injected = self.injected.write().expect("lock poisoned");
        let pos = injected.iter().position(|(op, _)| *op == operation)?;
        Some(injected.remove(pos).1)
    }

    /// Execute one command synchronously.
    pub fn execute(&self, operation: Operation, args: &[String]) -> StoreResult<Reply> {
        self.calls.write().expect("lock poisoned").push(RecordedCall {
            operation,
            args: args.to_vec(),
        });
        if let Some(message) = self.take_injected(operation) {
            return Err(StoreError::Injected(message));
        }

        let args = Args::new(operation, args);
        match operation {
            Operation::Get => self.get(&args),
            Operation::Set => self.set(&args),
            Operation::Del => self.del(&args),
            Operation::Type => self.type_of(&args),
            Operation::MGet => self.mget(&args),
            Operation::NumIncrBy => self.num_op(&args, NumOp::Add),
            Operation::NumMultBy => self.num_op(&args, NumOp::Mul),
            Operation::StrAppend => self.str_append(&args),
            Operation::StrLen => self.str_len(&args),
            Operation::ArrAppend => self.arr_append(&args),
            Operation::ArrIndex => self.arr_index(&args),
            Operation::ArrInsert => self.arr_insert(&args),
            Operation::ArrLen => self.arr_len(&args),
            Operation::ArrPop => self.arr_pop(&args),
            Operation::ArrTrim => self.arr_trim(&args),
            Operation::ObjKeys => self.obj_keys(&args),
            Operation::ObjLen => self.obj_len(&args),
            Operation::Debug => self.debug(&args),
            Operation::Resp => self.resp(&args),
        }
    }

    // ---- Read operations ----

    fn get(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, usize::MAX)?;
        let docs = self.documents.read().expect("lock poisoned");
        let Some(doc) = docs.get(args.key()) else {
            return Ok(Reply::Nil);
        };
        let paths = &args.items[1..];
        if paths.len() <= 1 {
            let path = args.path(1)?;
            let value = read_at(doc, &path)?;
            return Ok(Reply::bulk_json(value));
        }
        let mut out = serde_json::Map::new();
        for raw in paths {
            let path = Path::parse_canonical(raw)?;
            out.insert(raw.clone(), read_at(doc, &path)?.clone());
        }
        Ok(Reply::bulk_json(&Value::Object(out)))
    }

    fn type_of(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, 2)?;
        let path = args.path(1)?;
        let docs = self.documents.read().expect("lock poisoned");
        Ok(docs
            .get(args.key())
            .and_then(|doc| document::lookup(doc, &path))
            .map(|v| Reply::Status(JsonType::of(v).to_string()))
            .unwrap_or(Reply::Nil))
    }

    fn mget(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(2, usize::MAX)?;
        let (raw_path, keys) = args.items.split_last().ok_or(StoreError::WrongArity(args.command))?;
        let path = Path::parse_canonical(raw_path)?;
        let docs = self.documents.read().expect("lock poisoned");
        let replies = keys
            .iter()
            .map(|key| {
                docs.get(key)
                    .and_then(|doc| document::lookup(doc, &path))
                    .map(Reply::bulk_json)
                    .unwrap_or(Reply::Nil)
            })
            .collect();
        Ok(Reply::Array(replies))
    }

    fn str_len(&self, args: &Args<'_>) -> StoreResult<Reply> {
        self.inspect(args, |value| match value {
            Value::String(s) => Ok(Reply::Integer(s.len() as i64)),
            other => Err(wrong_type("string", other)),
        })
    }

    fn arr_len(&self, args: &Args<'_>) -> StoreResult<Reply> {
        self.inspect(args, |value| match value {
            Value::Array(items) => Ok(Reply::Integer(items.len() as i64)),
            other => Err(wrong_type("array", other)),
        })
    }

    fn arr_index(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(3, 5)?;
        let path = args.path(1)?;
        let needle = args.json(2)?;
        let start = args.optional_int(3)?.unwrap_or(0);
        let stop = args.optional_int(4)?.unwrap_or(0);
        let docs = self.documents.read().expect("lock poisoned");
        let doc = docs.get(args.key()).ok_or(StoreError::KeyMissing)?;
        let items = match read_at(doc, &path)? {
            Value::Array(items) => items,
            other => return Err(wrong_type("array", other)),
        };
        let len = items.len() as i64;
        let start = if start < 0 { (len + start).max(0) } else { start.min(len) };
        let stop = match stop {
            0 => len,
            s if s < 0 => (len + s).max(0),
            s => s.min(len),
        };
        let found = (start..stop)
            .find(|&i| items[i as usize] == needle)
            .unwrap_or(-1);
        Ok(Reply::Integer(found))
    }

    fn obj_keys(&self, args: &Args<'_>) -> StoreResult<Reply> {
        self.inspect(args, |value| match value {
            Value::Object(map) => Ok(Reply::Array(map.keys().cloned().map(Reply::Bulk).collect())),
            other => Err(wrong_type("object", other)),
        })
    }

    fn obj_len(&self, args: &Args<'_>) -> StoreResult<Reply> {
        self.inspect(args, |value| match value {
            Value::Object(map) => Ok(Reply::Integer(map.len() as i64)),
            other => Err(wrong_type("object", other)),
        })
    }

    fn debug(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, 3)?;
        let sub = args.items[0].as_str();
        if sub.eq_ignore_ascii_case("HELP") {
            return Ok(Reply::Array(vec![
                Reply::Status("MEMORY <key> [path] - reports the memory usage in bytes of a value".into()),
                Reply::Status("HELP - this message".into()),
            ]));
        }
        if !sub.eq_ignore_ascii_case("MEMORY") {
            return Err(StoreError::UnknownSubcommand(sub.to_string()));
        }
        let key = args.items.get(1).ok_or(StoreError::WrongArity(args.command))?;
        let path = match args.items.get(2) {
            Some(raw) => Path::parse_canonical(raw)?,
            None => Path::root(),
        };
        let docs = self.documents.read().expect("lock poisoned");
        let size = match docs.get(key.as_str()) {
            Some(doc) => read_at(doc, &path)?.to_string().len() as i64,
            None => 0,
        };
        Ok(Reply::Integer(size))
    }

    fn resp(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, 2)?;
        let path = args.path(1)?;
        let docs = self.documents.read().expect("lock poisoned");
        match docs.get(args.key()) {
            Some(doc) => Ok(to_resp(read_at(doc, &path)?)),
            None => Ok(Reply::Nil),
        }
    }

    /// Read-only query on the value at the path; a missing key replies nil.
    fn inspect(
        &self,
        args: &Args<'_>,
        f: impl FnOnce(&Value) -> StoreResult<Reply>,
    ) -> StoreResult<Reply> {
        args.require(1, 2)?;
        let path = args.path(1)?;
        let docs = self.documents.read().expect("lock poisoned");
        match docs.get(args.key()) {
            Some(doc) => f(read_at(doc, &path)?),
            None => Ok(Reply::Nil),
        }
    }

    // ---- Write operations ----

    fn set(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(3, 4)?;
        let path = args.path(1)?;
        let value = args.json(2)?;
        let condition = match args.items.get(3) {
            Some(flag) => SetCondition::from_flag(flag).ok_or(StoreError::Syntax)?,
            None => SetCondition::Always,
        };

        let mut docs = self.documents.write().expect("lock poisoned");
        let applied = match docs.get_mut(args.key()) {
            Some(doc) => document::set(doc, &path, value, condition)?,
            None if path.is_root() => {
                if condition.allows(false) {
                    docs.insert(args.key().to_string(), value);
                    true
                } else {
                    false
                }
            }
            None if condition == SetCondition::IfPresent => false,
            None => return Err(StoreError::MustCreateAtRoot),
        };
        Ok(if applied { Reply::ok() } else { Reply::Nil })
    }

    fn del(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, 2)?;
        let path = args.path(1)?;
        let mut docs = self.documents.write().expect("lock poisoned");
        let removed = if path.is_root() {
            usize::from(docs.remove(args.key()).is_some())
        } else {
            docs.get_mut(args.key())
                .map(|doc| document::delete(doc, &path))
                .unwrap_or(0)
        };
        Ok(Reply::Integer(removed as i64))
    }

    fn num_op(&self, args: &Args<'_>, op: NumOp) -> StoreResult<Reply> {
        args.require(3, 3)?;
        let path = args.path(1)?;
        let operand = match args.json(2)? {
            Value::Number(n) => n,
            _ => return Err(StoreError::NotANumber(args.items[2].clone())),
        };
        self.modify(args.key(), &path, |target| {
            let current = match &*target {
                Value::Number(n) => n.clone(),
                other => return Err(wrong_type("number", other)),
            };
            let result = op.apply(&current, &operand)?;
            *target = Value::Number(result);
            Ok(Reply::bulk_json(target))
        })
    }

    fn str_append(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(2, 3)?;
        // The path may be omitted: `JSON.STRAPPEND key "json"`.
        let (path, raw) = if args.items.len() == 3 {
            (args.path(1)?, 2)
        } else {
            (Path::root(), 1)
        };
        let suffix = match args.json(raw)? {
            Value::String(s) => s,
            other => return Err(wrong_type("string", &other)),
        };
        self.modify(args.key(), &path, |target| match target {
            Value::String(s) => {
                s.push_str(&suffix);
                Ok(Reply::Integer(s.len() as i64))
            }
            other => Err(wrong_type("string", other)),
        })
    }

    fn arr_append(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(3, usize::MAX)?;
        let path = args.path(1)?;
        let values = args.json_from(2)?;
        self.modify_array(args.key(), &path, |items| {
            items.extend(values);
            Ok(Reply::Integer(items.len() as i64))
        })
    }

    fn arr_insert(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(4, usize::MAX)?;
        let path = args.path(1)?;
        let index = args.int(2)?;
        let values = args.json_from(3)?;
        self.modify_array(args.key(), &path, |items| {
            let len = items.len() as i64;
            let at = if index < 0 { len + index } else { index };
            if at < 0 || at > len {
                return Err(StoreError::IndexOutOfRange);
            }
            let at = at as usize;
            for (offset, value) in values.into_iter().enumerate() {
                items.insert(at + offset, value);
            }
            Ok(Reply::Integer(items.len() as i64))
        })
    }

    fn arr_pop(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(1, 3)?;
        let path = args.path(1)?;
        let index = args.optional_int(2)?.unwrap_or(-1);
        self.modify_array(args.key(), &path, |items| {
            if items.is_empty() {
                return Ok(Reply::Nil);
            }
            let len = items.len() as i64;
            let at = if index < 0 { (len + index).max(0) } else { index.min(len - 1) };
            let popped = items.remove(at as usize);
            Ok(Reply::bulk_json(&popped))
        })
    }

    fn arr_trim(&self, args: &Args<'_>) -> StoreResult<Reply> {
        args.require(4, 4)?;
        let path = args.path(1)?;
        let start = args.int(2)?;
        let stop = args.int(3)?;
        self.modify_array(args.key(), &path, |items| {
            let len = items.len() as i64;
            let start = if start < 0 { (len + start).max(0) } else { start };
            let stop = if stop < 0 { len + stop } else { stop.min(len - 1) };
            if start >= len || start > stop {
                items.clear();
            } else {
                items.truncate(stop as usize + 1);
                items.drain(..start as usize);
            }
            Ok(Reply::Integer(items.len() as i64))
        })
    }

    /// Mutate the value at the path of an existing document.
    fn modify(
        &self,
        key: &str,
        path: &Path,
        f: impl FnOnce(&mut Value) -> StoreResult<Reply>,
    ) -> StoreResult<Reply> {
        let mut docs = self.documents.write().expect("lock poisoned");
        let doc = docs.get_mut(key).ok_or(StoreError::KeyMissing)?;
        f(document::require_mut(doc, path)?)
    }

    fn modify_array(
        &self,
        key: &str,
        path: &Path,
        f: impl FnOnce(&mut Vec<Value>) -> StoreResult<Reply>,
    ) -> StoreResult<Reply> {
        self.modify(key, path, |target| match target {
            Value::Array(items) => f(items),
            other => Err(wrong_type("array", other)),
        })
    }
}

impl Default for InMemoryJsonStore {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for InMemoryJsonStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryJsonStore")
            .field("document_count", &self.len())
            .finish()
    }
}

#[async_trait]
impl RemoteConnection for InMemoryJsonStore {
    async fn call(&self, handle: &OperationHandle, args: &[String]) -> ProtocolResult<Reply> {
        tokio::task::yield_now().await;
        trace!(command = handle.command(), ?args, "in-memory call");
        Ok(self.execute(handle.operation(), args)?)
    }
}

/// Positional arguments of one command.
struct Args<'a> {
    command: &'static str,
    items: &'a [String],
}

impl<'a> Args<'a> {
    fn new(operation: Operation, items: &'a [String]) -> Self {
        Self {
            command: operation.wire_name(),
            items,
        }
    }

    fn require(&self, min: usize, max: usize) -> StoreResult<()> {
        if self.items.len() < min || self.items.len() > max {
            return Err(StoreError::WrongArity(self.command));
        }
        Ok(())
    }

    fn key(&self) -> &str {
        &self.items[0]
    }

    /// The path at `index`, or the root when absent.
    fn path(&self, index: usize) -> StoreResult<Path> {
        match self.items.get(index) {
            Some(raw) => Ok(Path::parse_canonical(raw)?),
            None => Ok(Path::root()),
        }
    }

    fn json(&self, index: usize) -> StoreResult<Value> {
        let raw = self.items.get(index).ok_or(StoreError::WrongArity(self.command))?;
        serde_json::from_str(raw).map_err(|e| StoreError::InvalidJson(e.to_string()))
    }

    fn json_from(&self, index: usize) -> StoreResult<Vec<Value>> {
        (index..self.items.len()).map(|i| self.json(i)).collect()
    }

    fn int(&self, index: usize) -> StoreResult<i64> {
        let raw = self.items.get(index).ok_or(StoreError::WrongArity(self.command))?;
        raw.parse().map_err(|_| StoreError::NotANumber(raw.clone()))
    }

    fn optional_int(&self, index: usize) -> StoreResult<Option<i64>> {
        if index < self.items.len() {
            self.int(index).map(Some)
        } else {
            Ok(None)
        }
    }
}

#[derive(Clone, Copy)]
enum NumOp {
    Add,
    Mul,
}

impl NumOp {
    /// Integer arithmetic while both sides are integers and it does not
    /// overflow, floating point otherwise.
    fn apply(self, current: &Number, operand: &Number) -> StoreResult<Number> {
        if let (Some(a), Some(b)) = (current.as_i64(), operand.as_i64()) {
            let exact = match self {
                Self::Add => a.checked_add(b),
                Self::Mul => a.checked_mul(b),
            };
            if let Some(n) = exact {
                return Ok(Number::from(n));
            }
        }
        let a = current.as_f64().ok_or(StoreError::NotFinite)?;
        let b = operand.as_f64().ok_or(StoreError::NotFinite)?;
        let result = match self {
            Self::Add => a + b,
            Self::Mul => a * b,
        };
        Number::from_f64(result).ok_or(StoreError::NotFinite)
    }
}

fn read_at<'a>(doc: &'a Value, path: &Path) -> StoreResult<&'a Value> {
    document::lookup(doc, path).ok_or_else(|| StoreError::PathMissing(path.to_string()))
}

fn wrong_type(expected: &'static str, found: &Value) -> StoreError {
    StoreError::WrongType {
        expected,
        found: JsonType::of(found),
    }
}

/// Render a value in the store's RESP form: objects become `{` followed by
/// key/value pairs, arrays `[` followed by their elements.
fn to_resp(value: &Value) -> Reply {
    match value {
        Value::Null => Reply::Nil,
        Value::Bool(b) => Reply::Status(b.to_string()),
        Value::Number(n) => match n.as_i64() {
            Some(i) => Reply::Integer(i),
            None => Reply::Bulk(n.to_string()),
        },
        Value::String(s) => Reply::Bulk(s.clone()),
        Value::Array(items) => {
            let mut out = vec![Reply::Status("[".into())];
            out.extend(items.iter().map(to_resp));
            Reply::Array(out)
        }
        Value::Object(map) => {
            let mut out = vec![Reply::Status("{".into())];
            for (k, v) in map {
                out.push(Reply::Bulk(k.clone()));
                out.push(to_resp(v));
            }
            Reply::Array(out)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn exec(store: &InMemoryJsonStore, op: Operation, args: &[&str]) -> StoreResult<Reply> {
        let args: Vec<String> = args.iter().map(|s| s.to_string()).collect();
        store.execute(op, &args)
    }

    fn seeded() -> InMemoryJsonStore {
        let store = InMemoryJsonStore::new();
        store.insert("doc", json!({"a": {"n": 1, "s": "ab", "arr": [1, 2, 3]}}));
        store
    }

    #[test]
    fn set_new_key_requires_root() {
        let store = InMemoryJsonStore::new();
        let err = exec(&store, Operation::Set, &["k", "['a']", "1"]).unwrap_err();
        assert!(matches!(err, StoreError::MustCreateAtRoot));
        assert!(store.is_empty());

        let reply = exec(&store, Operation::Set, &["k", ".", r#"{"a":1}"#]).unwrap();
        assert_eq!(reply, Reply::ok());
        assert_eq!(store.document("k"), Some(json!({"a": 1})));
    }

    #[test]
    fn set_conditions_reply_nil() {
        let store = seeded();
        let reply = exec(&store, Operation::Set, &["doc", "['a']['n']", "5", "NX"]).unwrap();
        assert_eq!(reply, Reply::Nil);
        let reply = exec(&store, Operation::Set, &["new", "['x']", "5", "XX"]).unwrap();
        assert_eq!(reply, Reply::Nil);
        let reply = exec(&store, Operation::Set, &["new", ".", "5", "XX"]).unwrap();
        assert_eq!(reply, Reply::Nil);
        assert!(store.document("new").is_none());
    }

    #[test]
    fn set_rejects_bad_json_and_flags() {
        let store = seeded();
        assert!(matches!(
            exec(&store, Operation::Set, &["doc", ".", "{oops"]).unwrap_err(),
            StoreError::InvalidJson(_)
        ));
        assert!(matches!(
            exec(&store, Operation::Set, &["doc", ".", "1", "ZZ"]).unwrap_err(),
            StoreError::Syntax
        ));
        assert!(matches!(
            exec(&store, Operation::Set, &["doc"]).unwrap_err(),
            StoreError::WrongArity("JSON.SET")
        ));
    }

    #[test]
    fn get_single_and_multi_path() {
        let store = seeded();
        let reply = exec(&store, Operation::Get, &["doc", "['a']['n']"]).unwrap();
        assert_eq!(reply, Reply::Bulk("1".into()));
        let reply = exec(&store, Operation::Get, &["doc", "['a']['n']", "['a']['s']"]).unwrap();
        assert_eq!(reply.into_value(), json!({"['a']['n']": 1, "['a']['s']": "ab"}));
        assert_eq!(exec(&store, Operation::Get, &["nope"]).unwrap(), Reply::Nil);
        assert!(matches!(
            exec(&store, Operation::Get, &["doc", "['zz']"]).unwrap_err(),
            StoreError::PathMissing(_)
        ));
    }

    #[test]
    fn type_reports_nil_for_missing() {
        let store = seeded();
        assert_eq!(
            exec(&store, Operation::Type, &["doc", "['a']"]).unwrap(),
            Reply::Status("object".into())
        );
        assert_eq!(exec(&store, Operation::Type, &["doc", "['a']['zz']"]).unwrap(), Reply::Nil);
        assert_eq!(exec(&store, Operation::Type, &["missing", "."]).unwrap(), Reply::Nil);
    }

    #[test]
    fn mget_nil_for_missing() {
        let store = seeded();
        store.insert("other", json!({"a": 2}));
        let reply = exec(&store, Operation::MGet, &["doc", "other", "none", "['a']['n']"]).unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![Reply::Bulk("1".into()), Reply::Nil, Reply::Nil])
        );
    }

    #[test]
    fn del_root_and_path() {
        let store = seeded();
        assert_eq!(exec(&store, Operation::Del, &["doc", "['a']['n']"]).unwrap(), Reply::Integer(1));
        assert_eq!(exec(&store, Operation::Del, &["doc", "['a']['n']"]).unwrap(), Reply::Integer(0));
        assert_eq!(exec(&store, Operation::Del, &["doc"]).unwrap(), Reply::Integer(1));
        assert_eq!(exec(&store, Operation::Del, &["doc"]).unwrap(), Reply::Integer(0));
        assert!(store.is_empty());
    }

    #[test]
    fn numeric_operations() {
        let store = seeded();
        let reply = exec(&store, Operation::NumIncrBy, &["doc", "['a']['n']", "4"]).unwrap();
        assert_eq!(reply.into_value(), json!(5));
        let reply = exec(&store, Operation::NumMultBy, &["doc", "['a']['n']", "1.5"]).unwrap();
        assert_eq!(reply.into_value(), json!(7.5));
        assert!(matches!(
            exec(&store, Operation::NumIncrBy, &["doc", "['a']['s']", "1"]).unwrap_err(),
            StoreError::WrongType { expected: "number", .. }
        ));
        assert!(matches!(
            exec(&store, Operation::NumIncrBy, &["doc", "['a']['n']", "\"x\""]).unwrap_err(),
            StoreError::NotANumber(_)
        ));
        assert!(matches!(
            exec(&store, Operation::NumIncrBy, &["nope", ".", "1"]).unwrap_err(),
            StoreError::KeyMissing
        ));
    }

    #[test]
    fn integer_overflow_falls_back_to_float() {
        let store = InMemoryJsonStore::new();
        store.insert("n", json!(i64::MAX));
        let reply = exec(&store, Operation::NumIncrBy, &["n", ".", "1"]).unwrap();
        assert!(reply.into_value().is_f64());
    }

    #[test]
    fn string_operations() {
        let store = seeded();
        let reply = exec(&store, Operation::StrAppend, &["doc", "['a']['s']", "\"cd\""]).unwrap();
        assert_eq!(reply, Reply::Integer(4));
        let reply = exec(&store, Operation::StrLen, &["doc", "['a']['s']"]).unwrap();
        assert_eq!(reply, Reply::Integer(4));
        assert_eq!(exec(&store, Operation::StrLen, &["nope", "."]).unwrap(), Reply::Nil);
        assert!(matches!(
            exec(&store, Operation::StrAppend, &["doc", "['a']['s']", "5"]).unwrap_err(),
            StoreError::WrongType { expected: "string", .. }
        ));
    }

    #[test]
    fn array_append_insert_len() {
        let store = seeded();
        let p = "['a']['arr']";
        assert_eq!(exec(&store, Operation::ArrAppend, &["doc", p, "4", "5"]).unwrap(), Reply::Integer(5));
        assert_eq!(exec(&store, Operation::ArrInsert, &["doc", p, "0", "0"]).unwrap(), Reply::Integer(6));
        assert_eq!(exec(&store, Operation::ArrInsert, &["doc", p, "-1", "\"x\""]).unwrap(), Reply::Integer(7));
        assert!(matches!(
            exec(&store, Operation::ArrInsert, &["doc", p, "99", "1"]).unwrap_err(),
            StoreError::IndexOutOfRange
        ));
        assert_eq!(exec(&store, Operation::ArrLen, &["doc", p]).unwrap(), Reply::Integer(7));
        assert_eq!(
            store.document("doc").unwrap()["a"]["arr"],
            json!([0, 1, 2, 3, 4, "x", 5])
        );
    }

    #[test]
    fn array_index_with_ranges() {
        let store = InMemoryJsonStore::new();
        store.insert("a", json!([1, 2, 3, 2, 1]));
        assert_eq!(exec(&store, Operation::ArrIndex, &["a", ".", "2"]).unwrap(), Reply::Integer(1));
        assert_eq!(exec(&store, Operation::ArrIndex, &["a", ".", "2", "2"]).unwrap(), Reply::Integer(3));
        assert_eq!(exec(&store, Operation::ArrIndex, &["a", ".", "2", "0", "2"]).unwrap(), Reply::Integer(1));
        assert_eq!(exec(&store, Operation::ArrIndex, &["a", ".", "1", "-2"]).unwrap(), Reply::Integer(4));
        assert_eq!(exec(&store, Operation::ArrIndex, &["a", ".", "9"]).unwrap(), Reply::Integer(-1));
    }

    #[test]
    fn array_pop_and_trim() {
        let store = InMemoryJsonStore::new();
        store.insert("a", json!([1, 2, 3, 4, 5]));
        assert_eq!(exec(&store, Operation::ArrPop, &["a"]).unwrap(), Reply::Bulk("5".into()));
        assert_eq!(exec(&store, Operation::ArrPop, &["a", ".", "0"]).unwrap(), Reply::Bulk("1".into()));
        assert_eq!(exec(&store, Operation::ArrPop, &["a", ".", "99"]).unwrap(), Reply::Bulk("4".into()));
        assert_eq!(store.document("a"), Some(json!([2, 3])));

        store.insert("t", json!([0, 1, 2, 3, 4]));
        assert_eq!(exec(&store, Operation::ArrTrim, &["t", ".", "1", "-2"]).unwrap(), Reply::Integer(3));
        assert_eq!(store.document("t"), Some(json!([1, 2, 3])));
        assert_eq!(exec(&store, Operation::ArrTrim, &["t", ".", "5", "9"]).unwrap(), Reply::Integer(0));

        store.insert("e", json!([]));
        assert_eq!(exec(&store, Operation::ArrPop, &["e"]).unwrap(), Reply::Nil);
    }

    #[test]
    fn object_introspection() {
        let store = seeded();
        let keys = exec(&store, Operation::ObjKeys, &["doc", "['a']"]).unwrap().into_value();
        let mut keys: Vec<String> = serde_json::from_value(keys).unwrap();
        keys.sort();
        assert_eq!(keys, vec!["arr", "n", "s"]);
        assert_eq!(exec(&store, Operation::ObjLen, &["doc", "['a']"]).unwrap(), Reply::Integer(3));
        assert_eq!(exec(&store, Operation::ObjLen, &["nope"]).unwrap(), Reply::Nil);
        assert!(exec(&store, Operation::ObjLen, &["doc", "['a']['n']"]).is_err());
    }

    #[test]
    fn debug_memory_and_help() {
        let store = seeded();
        let Reply::Integer(size) = exec(&store, Operation::Debug, &["MEMORY", "doc"]).unwrap() else {
            panic!("expected integer");
        };
        assert!(size > 0);
        assert_eq!(exec(&store, Operation::Debug, &["memory", "nope"]).unwrap(), Reply::Integer(0));
        assert!(matches!(exec(&store, Operation::Debug, &["HELP"]).unwrap(), Reply::Array(_)));
        assert!(matches!(
            exec(&store, Operation::Debug, &["FLUSH", "doc"]).unwrap_err(),
            StoreError::UnknownSubcommand(_)
        ));
    }

    #[test]
    fn resp_rendering() {
        let store = InMemoryJsonStore::new();
        store.insert("r", json!({"a": [1, true, null, "x"]}));
        let reply = exec(&store, Operation::Resp, &["r"]).unwrap();
        assert_eq!(
            reply,
            Reply::Array(vec![
                Reply::Status("{".into()),
                Reply::Bulk("a".into()),
                Reply::Array(vec![
                    Reply::Status("[".into()),
                    Reply::Integer(1),
                    Reply::Status("true".into()),
                    Reply::Nil,
                    Reply::Bulk("x".into()),
                ]),
            ])
        );
    }

    #[test]
    fn calls_are_recorded_and_failures_injected() {
        let store = seeded();
        store.fail_next(Operation::Get, "ERR boom");
        let err = exec(&store, Operation::Get, &["doc"]).unwrap_err();
        assert_eq!(err.to_string(), "ERR boom");
        assert!(exec(&store, Operation::Get, &["doc"]).is_ok());
        assert_eq!(store.call_count(Operation::Get), 2);
        assert_eq!(store.calls()[0].args, vec!["doc".to_string()]);
        store.clear_calls();
        assert!(store.calls().is_empty());
    }

    #[tokio::test]
    async fn answers_through_remote_connection() {
        let store = seeded();
        let handle = store.bind(Operation::Type);
        let reply = store.call(&handle, &["doc".into(), ".".into()]).await.unwrap();
        assert_eq!(reply, Reply::Status("object".into()));

        let handle = store.bind(Operation::Set);
        let err = store
            .call(&handle, &["new".into(), "['a']['b']".into(), "1".into()])
            .await
            .unwrap_err();
        assert!(err.message().contains("new objects must be created at the root"));
    }
}
