use jsonkv_protocol::SetCondition;
use jsonkv_types::CanonicalPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Per-call options for a document write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SetOptions {
    pub condition: SetCondition,
    /// Create missing ancestors when the direct write fails because of them.
    pub auto_create: bool,
}

impl SetOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn auto_create(mut self, enabled: bool) -> Self {
        self.auto_create = enabled;
        self
    }

    pub fn condition(mut self, condition: SetCondition) -> Self {
        self.condition = condition;
        self
    }
}

/// What an auto-create write did to get the value stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Materialization {
    /// Deepest existing ancestor, or the root when the document was absent.
    pub anchor: CanonicalPath,
    /// Where the corrective write was sent.
    pub target: CanonicalPath,
    /// Existence probes issued during the walk.
    pub probes: usize,
}

/// Outcome of a document write.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WriteResult {
    /// `false` when the write's condition prevented it.
    pub applied: bool,
    /// The normalized reply of the write that took effect.
    pub reply: Value,
    pub materialization: Option<Materialization>,
}

impl WriteResult {
    pub(crate) fn from_reply(reply: Value, materialization: Option<Materialization>) -> Self {
        Self {
            applied: !reply.is_null(),
            reply,
            materialization,
        }
    }

    pub fn materialized(&self) -> bool {
        self.materialization.is_some()
    }
}
