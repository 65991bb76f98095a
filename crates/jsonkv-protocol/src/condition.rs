use serde::{Deserialize, Serialize};

/// Condition attached to a document write.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetCondition {
    #[default]
    Always,
    /// Only when nothing exists at the target (`NX`).
    IfAbsent,
    /// Only when something exists at the target (`XX`).
    IfPresent,
}

impl SetCondition {
    /// The trailing wire flag, if any.
    pub fn flag(&self) -> Option<&'static str> {
        match self {
            Self::Always => None,
            Self::IfAbsent => Some("NX"),
            Self::IfPresent => Some("XX"),
        }
    }

    pub fn from_flag(flag: &str) -> Option<Self> {
        if flag.eq_ignore_ascii_case("NX") {
            Some(Self::IfAbsent)
        } else if flag.eq_ignore_ascii_case("XX") {
            Some(Self::IfPresent)
        } else {
            None
        }
    }

    pub fn allows(&self, exists: bool) -> bool {
        match self {
            Self::Always => true,
            Self::IfAbsent => !exists,
            Self::IfPresent => exists,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_roundtrip() {
        for c in [SetCondition::IfAbsent, SetCondition::IfPresent] {
            assert_eq!(SetCondition::from_flag(c.flag().unwrap()), Some(c));
        }
        assert_eq!(SetCondition::Always.flag(), None);
        assert_eq!(SetCondition::from_flag("nx"), Some(SetCondition::IfAbsent));
        assert_eq!(SetCondition::from_flag("YY"), None);
    }

    #[test]
    fn allows_by_existence() {
        assert!(SetCondition::Always.allows(true));
        assert!(SetCondition::Always.allows(false));
        assert!(SetCondition::IfAbsent.allows(false));
        assert!(!SetCondition::IfAbsent.allows(true));
        assert!(SetCondition::IfPresent.allows(true));
        assert!(!SetCondition::IfPresent.allows(false));
    }
}
