use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The fixed set of operations the store exposes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Operation {
    Get,
    Set,
    Del,
    Type,
    MGet,
    NumIncrBy,
    NumMultBy,
    StrAppend,
    StrLen,
    ArrAppend,
    ArrIndex,
    ArrInsert,
    ArrLen,
    ArrPop,
    ArrTrim,
    ObjKeys,
    ObjLen,
    Debug,
    Resp,
}

impl Operation {
    pub const ALL: [Operation; 19] = [
        Self::Get,
        Self::Set,
        Self::Del,
        Self::Type,
        Self::MGet,
        Self::NumIncrBy,
        Self::NumMultBy,
        Self::StrAppend,
        Self::StrLen,
        Self::ArrAppend,
        Self::ArrIndex,
        Self::ArrInsert,
        Self::ArrLen,
        Self::ArrPop,
        Self::ArrTrim,
        Self::ObjKeys,
        Self::ObjLen,
        Self::Debug,
        Self::Resp,
    ];

    /// Command name as sent on the wire.
    pub fn wire_name(&self) -> &'static str {
        match self {
            Self::Get => "JSON.GET",
            Self::Set => "JSON.SET",
            Self::Del => "JSON.DEL",
            Self::Type => "JSON.TYPE",
            Self::MGet => "JSON.MGET",
            Self::NumIncrBy => "JSON.NUMINCRBY",
            Self::NumMultBy => "JSON.NUMMULTBY",
            Self::StrAppend => "JSON.STRAPPEND",
            Self::StrLen => "JSON.STRLEN",
            Self::ArrAppend => "JSON.ARRAPPEND",
            Self::ArrIndex => "JSON.ARRINDEX",
            Self::ArrInsert => "JSON.ARRINSERT",
            Self::ArrLen => "JSON.ARRLEN",
            Self::ArrPop => "JSON.ARRPOP",
            Self::ArrTrim => "JSON.ARRTRIM",
            Self::ObjKeys => "JSON.OBJKEYS",
            Self::ObjLen => "JSON.OBJLEN",
            Self::Debug => "JSON.DEBUG",
            Self::Resp => "JSON.RESP",
        }
    }

    /// Resolve an operation by wire name, ignoring ASCII case.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.wire_name().eq_ignore_ascii_case(name))
    }

    /// Operations that modify the document.
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Self::Set
                | Self::Del
                | Self::NumIncrBy
                | Self::NumMultBy
                | Self::StrAppend
                | Self::ArrAppend
                | Self::ArrInsert
                | Self::ArrPop
                | Self::ArrTrim
        )
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// A reusable capability for issuing one operation.
///
/// Handles are cheap to clone and carry no connection state; binding the
/// same operation twice yields equal handles.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct OperationHandle {
    operation: Operation,
    command: Arc<str>,
}

impl OperationHandle {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            command: Arc::from(operation.wire_name()),
        }
    }

    pub fn operation(&self) -> Operation {
        self.operation
    }

    pub fn command(&self) -> &str {
        &self.command
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn wire_names_unique() {
        let names: HashSet<&str> = Operation::ALL.iter().map(|op| op.wire_name()).collect();
        assert_eq!(names.len(), Operation::ALL.len());
    }

    #[test]
    fn from_name_roundtrips() {
        for op in Operation::ALL {
            assert_eq!(Operation::from_name(op.wire_name()), Some(op));
        }
    }

    #[test]
    fn from_name_ignores_case() {
        assert_eq!(Operation::from_name("json.set"), Some(Operation::Set));
        assert_eq!(Operation::from_name("Json.ArrPop"), Some(Operation::ArrPop));
    }

    #[test]
    fn from_name_rejects_unknown() {
        assert_eq!(Operation::from_name("JSON.MERGE"), None);
        assert_eq!(Operation::from_name("GET"), None);
        assert_eq!(Operation::from_name(""), None);
    }

    #[test]
    fn write_classification() {
        assert!(Operation::Set.is_write());
        assert!(Operation::ArrPop.is_write());
        assert!(!Operation::Get.is_write());
        assert!(!Operation::Type.is_write());
        assert!(!Operation::MGet.is_write());
    }

    #[test]
    fn handles_are_idempotent() {
        let a = OperationHandle::new(Operation::Set);
        let b = OperationHandle::new(Operation::Set);
        assert_eq!(a, b);
        assert_eq!(a.command(), "JSON.SET");
        assert_eq!(a.operation(), Operation::Set);
    }
}
