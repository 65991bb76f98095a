//! Path navigation and mutation on a single JSON document.

use jsonkv_protocol::SetCondition;
use jsonkv_types::{JsonType, Path, Segment};
use serde_json::Value;

use crate::error::{StoreError, StoreResult};

fn index_of(segment: &Segment) -> Option<usize> {
    match segment {
        Segment::Index(i) => usize::try_from(*i).ok(),
        Segment::Name(_) => None,
    }
}

/// Object keys are looked up by the segment's text, so `Index(0)` also
/// addresses the property `"0"`.
fn child<'a>(value: &'a Value, segment: &Segment) -> Option<&'a Value> {
    match value {
        Value::Object(map) => map.get(&segment.to_string()),
        Value::Array(items) => index_of(segment).and_then(|i| items.get(i)),
        _ => None,
    }
}

fn child_mut<'a>(value: &'a mut Value, segment: &Segment) -> StoreResult<Option<&'a mut Value>> {
    match value {
        Value::Object(map) => Ok(map.get_mut(&segment.to_string())),
        Value::Array(items) => match index_of(segment) {
            Some(i) => Ok(items.get_mut(i)),
            None => Err(StoreError::WrongType {
                expected: "object",
                found: JsonType::Array,
            }),
        },
        other => Err(StoreError::WrongType {
            expected: "object",
            found: JsonType::of(other),
        }),
    }
}

/// The value at `path`, if every segment resolves.
pub fn lookup<'a>(root: &'a Value, path: &Path) -> Option<&'a Value> {
    path.segments()
        .iter()
        .try_fold(root, |current, segment| child(current, segment))
}

pub fn lookup_mut<'a>(root: &'a mut Value, path: &Path) -> Option<&'a mut Value> {
    let mut current = root;
    for segment in path.segments() {
        current = child_mut(current, segment).ok().flatten()?;
    }
    Some(current)
}

/// Like [`lookup_mut`] but a missing location is an error.
pub fn require_mut<'a>(root: &'a mut Value, path: &Path) -> StoreResult<&'a mut Value> {
    lookup_mut(root, path).ok_or_else(|| StoreError::PathMissing(path.to_string()))
}

/// Write `value` at `path` inside an existing document.
///
/// Only the last segment may be created; every ancestor must already exist.
/// Returns `false` when `condition` prevented the write.
pub fn set(
    root: &mut Value,
    path: &Path,
    value: Value,
    condition: SetCondition,
) -> StoreResult<bool> {
    let Some((parent_path, last)) = path.split_last() else {
        if !condition.allows(true) {
            return Ok(false);
        }
        *root = value;
        return Ok(true);
    };

    let mut parent = root;
    for (level, segment) in parent_path.segments().iter().enumerate() {
        parent = match child_mut(parent, segment)? {
            Some(next) => next,
            None if level == 0 => return Err(StoreError::MissingAtRootLevel(segment.to_string())),
            None => return Err(StoreError::MissingIntermediate),
        };
    }

    match parent {
        Value::Object(map) => {
            let key = last.to_string();
            if !condition.allows(map.contains_key(&key)) {
                return Ok(false);
            }
            map.insert(key, value);
            Ok(true)
        }
        Value::Array(items) => {
            let slot = index_of(last)
                .ok_or(StoreError::WrongType {
                    expected: "object",
                    found: JsonType::Array,
                })?;
            let Some(existing) = items.get_mut(slot) else {
                // Arrays only grow through the array operations.
                if !condition.allows(false) {
                    return Ok(false);
                }
                return Err(StoreError::IndexOutOfRange);
            };
            if !condition.allows(true) {
                return Ok(false);
            }
            *existing = value;
            Ok(true)
        }
        other => Err(StoreError::WrongType {
            expected: "object",
            found: JsonType::of(other),
        }),
    }
}

/// Remove the value at `path`. Returns the number of values removed.
///
/// The root cannot be removed here; deleting a whole document is the
/// store's job.
pub fn delete(root: &mut Value, path: &Path) -> usize {
    let Some((parent_path, last)) = path.split_last() else {
        return 0;
    };
    match lookup_mut(root, &parent_path) {
        Some(Value::Object(map)) => usize::from(map.remove(&last.to_string()).is_some()),
        Some(Value::Array(items)) => match index_of(last) {
            Some(i) if i < items.len() => {
                items.remove(i);
                1
            }
            _ => 0,
        },
        _ => 0,
    }
}
