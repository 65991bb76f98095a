//! Auto-create writes.
//!
//! The store only creates the last segment of a written path, and only
//! creates a new key through a write at the root. When a direct write fails
//! for one of those reasons, [`AncestorMaterializer`] walks from the target
//! toward the root, probing each prefix with `JSON.TYPE`, until it finds the
//! deepest ancestor that exists (the anchor). Every missing segment it passes
//! wraps the value in one more single-key object. One corrective write then
//! stores the built value directly under the anchor, or as the whole
//! document when nothing exists.
//!
//! Probes and the corrective write are separate remote calls. Another writer
//! can change the document in between, and a corrective write can then
//! replace containers that writer created. Callers needing stronger
//! guarantees must serialize writes to a key themselves.

use jsonkv_protocol::{Operation, SetCondition};
use jsonkv_types::{CanonicalPath, Path, Segment};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use crate::dispatcher::CommandDispatcher;
use crate::error::ClientResult;
use crate::write::{Materialization, SetOptions, WriteResult};

/// The walk's result: the single write that will store the value.
#[derive(Clone, Debug, PartialEq)]
pub struct MaterializationPlan {
    pub anchor: Path,
    pub target: Path,
    /// The caller's value wrapped once per missing container.
    pub value: Value,
    pub probes: usize,
}

impl MaterializationPlan {
    /// Whether the whole document will be written.
    pub fn creates_document(&self) -> bool {
        self.target.is_root()
    }
}

pub struct AncestorMaterializer<'a> {
    dispatcher: &'a CommandDispatcher,
}

impl<'a> AncestorMaterializer<'a> {
    pub fn new(dispatcher: &'a CommandDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Write `value` at `path`, creating missing ancestors when allowed.
    ///
    /// The direct write is tried first. Only failures classified as a
    /// missing ancestor start the walk, and only when `options.auto_create`
    /// is set; everything else propagates unchanged.
    pub async fn write_with_auto_create(
        &self,
        key: &str,
        path: &Path,
        value: Value,
        options: SetOptions,
    ) -> ClientResult<WriteResult> {
        let err = match self.write(key, &path.to_canonical(), &value, options.condition).await {
            Ok(reply) => return Ok(WriteResult::from_reply(reply, None)),
            Err(err) => err,
        };
        if !options.auto_create || !err.allows_auto_create() || path.is_root() {
            return Err(err);
        }
        debug!(key = %key, path = %path, error = %err, "direct write failed, materializing ancestors");

        let plan = self.plan(key, path, value).await?;
        self.apply(key, plan, options.condition).await
    }

    /// Walk toward the root and build the corrective write.
    ///
    /// Issues one `JSON.TYPE` probe per visited prefix, at most
    /// `path.len()` of them, and never writes.
    pub async fn plan(&self, key: &str, path: &Path, value: Value) -> ClientResult<MaterializationPlan> {
        let mut value = value;
        let mut probes = 0;

        for depth in (0..path.len()).rev() {
            let prefix = path.prefix(depth);
            probes += 1;
            if self.exists(key, &prefix.to_canonical()).await? {
                return Ok(MaterializationPlan {
                    anchor: prefix,
                    target: path.prefix(depth + 1),
                    value,
                    probes,
                });
            }
            value = wrap(&path.segments()[depth], value);
        }

        Ok(MaterializationPlan {
            anchor: Path::root(),
            target: Path::root(),
            value,
            probes,
        })
    }

    /// Issue the corrective write of `plan`.
    pub async fn apply(
        &self,
        key: &str,
        plan: MaterializationPlan,
        condition: SetCondition,
    ) -> ClientResult<WriteResult> {
        let target = plan.target.to_canonical();
        let materialization = Materialization {
            anchor: plan.anchor.to_canonical(),
            target: target.clone(),
            probes: plan.probes,
        };
        match self.write(key, &target, &plan.value, condition).await {
            Ok(reply) => {
                info!(
                    key = %key,
                    anchor = %materialization.anchor,
                    target = %target,
                    probes = plan.probes,
                    "materialized missing ancestors"
                );
                Ok(WriteResult::from_reply(reply, Some(materialization)))
            }
            Err(err) => {
                warn!(key = %key, target = %target, error = %err, "corrective write failed");
                Err(err)
            }
        }
    }

    async fn write(
        &self,
        key: &str,
        path: &CanonicalPath,
        value: &Value,
        condition: SetCondition,
    ) -> ClientResult<Value> {
        let mut args = vec![key.to_string(), path.to_string(), value.to_string()];
        args.extend(condition.flag().map(String::from));
        self.dispatcher.invoke_op(Operation::Set, args).await
    }

    async fn exists(&self, key: &str, path: &CanonicalPath) -> ClientResult<bool> {
        let kind = self
            .dispatcher
            .invoke_op(Operation::Type, vec![key.to_string(), path.to_string()])
            .await?;
        debug!(key = %key, path = %path, kind = %kind, "probed ancestor");
        Ok(!kind.is_null())
    }
}

/// `{segment: value}`. Index segments become object keys as well.
fn wrap(segment: &Segment, value: Value) -> Value {
    let mut map = Map::new();
    map.insert(segment.to_string(), value);
    Value::Object(map)
}
