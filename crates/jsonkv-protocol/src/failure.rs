//! Classification of error replies.
//!
//! The store reports failures as free text only. Categories are derived by
//! substring matching against a list of [`TriggerPattern`]s; the list is data
//! so it can follow the wording of whichever store version is deployed.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Error wording of the store that the default patterns match.
pub mod messages {
    pub const MISSING_INTERMEDIATE: &str = "missing key at non-terminal path level";
    pub const MUST_CREATE_AT_ROOT: &str = "new objects must be created at the root";
    pub const DEPTH_ZERO: &str = "at level 0 in path";
}

/// Category of a failed remote call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    /// A container between the root and the target does not exist.
    MissingIntermediateAncestor,
    /// The key does not exist, so only a root write can create it.
    MustCreateAtRoot,
    /// The first segment of the path does not exist.
    FailureAtPathDepthZero,
    Other,
}

impl FailureCategory {
    /// Whether a write failing this way can be retried by creating ancestors.
    pub fn allows_auto_create(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MissingIntermediateAncestor => "missing intermediate ancestor",
            Self::MustCreateAtRoot => "must create at root",
            Self::FailureAtPathDepthZero => "failure at path depth zero",
            Self::Other => "other",
        };
        f.write_str(name)
    }
}

/// A substring that, when found in an error message, assigns `category`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerPattern {
    pub category: FailureCategory,
    pub needle: String,
}

impl TriggerPattern {
    pub fn new(category: FailureCategory, needle: impl Into<String>) -> Self {
        Self {
            category,
            needle: needle.into(),
        }
    }

    /// The three patterns matching the store's current wording.
    pub fn defaults() -> Vec<Self> {
        vec![
            Self::new(FailureCategory::MissingIntermediateAncestor, messages::MISSING_INTERMEDIATE),
            Self::new(FailureCategory::MustCreateAtRoot, messages::MUST_CREATE_AT_ROOT),
            Self::new(FailureCategory::FailureAtPathDepthZero, messages::DEPTH_ZERO),
        ]
    }
}

/// Maps raw error text to a [`FailureCategory`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FailureClassifier {
    patterns: Vec<TriggerPattern>,
}

impl FailureClassifier {
    pub fn new(patterns: Vec<TriggerPattern>) -> Self {
        Self { patterns }
    }

    /// First matching pattern wins; no match is `Other`. Empty needles never match.
    pub fn classify(&self, message: &str) -> FailureCategory {
        self.patterns
            .iter()
            .find(|p| !p.needle.is_empty() && message.contains(p.needle.as_str()))
            .map(|p| p.category)
            .unwrap_or(FailureCategory::Other)
    }
}

impl Default for FailureClassifier {
    fn default() -> Self {
        Self::new(TriggerPattern::defaults())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_patterns_classify_store_wording() {
        let c = FailureClassifier::default();
        assert_eq!(
            c.classify("ERR missing key at non-terminal path level"),
            FailureCategory::MissingIntermediateAncestor
        );
        assert_eq!(
            c.classify("ERR new objects must be created at the root"),
            FailureCategory::MustCreateAtRoot
        );
        assert_eq!(
            c.classify("ERR key 'a' does not exist at level 0 in path"),
            FailureCategory::FailureAtPathDepthZero
        );
    }

    #[test]
    fn unmatched_is_other() {
        let c = FailureClassifier::default();
        assert_eq!(c.classify("ERR wrong type of path value"), FailureCategory::Other);
        assert_eq!(c.classify(""), FailureCategory::Other);
        assert_eq!(
            c.classify("ERR key 'b' does not exist at level 1 in path"),
            FailureCategory::Other
        );
    }

    #[test]
    fn custom_patterns_replace_defaults() {
        let c = FailureClassifier::new(vec![TriggerPattern::new(
            FailureCategory::MustCreateAtRoot,
            "no such document",
        )]);
        assert_eq!(c.classify("ERR no such document"), FailureCategory::MustCreateAtRoot);
        assert_eq!(
            c.classify("ERR new objects must be created at the root"),
            FailureCategory::Other
        );
    }

    #[test]
    fn empty_needle_never_matches() {
        let c = FailureClassifier::new(vec![TriggerPattern::new(FailureCategory::MustCreateAtRoot, "")]);
        assert_eq!(c.classify("anything"), FailureCategory::Other);
    }

    #[test]
    fn auto_create_eligibility() {
        assert!(FailureCategory::MissingIntermediateAncestor.allows_auto_create());
        assert!(FailureCategory::MustCreateAtRoot.allows_auto_create());
        assert!(FailureCategory::FailureAtPathDepthZero.allows_auto_create());
        assert!(!FailureCategory::Other.allows_auto_create());
    }

    #[test]
    fn pattern_serde_uses_snake_case() {
        let p = TriggerPattern::new(FailureCategory::FailureAtPathDepthZero, "x");
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, r#"{"category":"failure_at_path_depth_zero","needle":"x"}"#);
    }
}
