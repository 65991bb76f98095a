//! Client configuration.
//!
//! ```toml
//! auto_create = true
//!
//! [[triggers]]
//! category = "missing_intermediate_ancestor"
//! needle = "missing key at non-terminal path level"
//! ```
//!
//! Omitted fields take their defaults; an omitted `triggers` list means the
//! three patterns matching the store's current error wording.

use std::path::Path as FsPath;

use jsonkv_protocol::{FailureCategory, FailureClassifier, TriggerPattern};
use serde::{Deserialize, Serialize};

use crate::error::{ClientError, ClientResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Whether plain `set` calls create missing ancestors.
    pub auto_create: bool,
    /// Error substrings that mark a write as retryable by auto-create.
    pub triggers: Vec<TriggerPattern>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            auto_create: false,
            triggers: TriggerPattern::defaults(),
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(text: &str) -> ClientResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| ClientError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<FsPath>) -> ClientResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
            .map_err(|e| ClientError::Config(format!("{}: {e}", path.display())))
    }

    pub fn to_toml_string(&self) -> ClientResult<String> {
        toml::to_string(self).map_err(|e| ClientError::Config(e.to_string()))
    }

    /// Triggers must name a real category and a non-empty needle.
    pub fn validate(&self) -> ClientResult<()> {
        for (i, trigger) in self.triggers.iter().enumerate() {
            if trigger.needle.is_empty() {
                return Err(ClientError::Config(format!("trigger {i} has an empty needle")));
            }
            if trigger.category == FailureCategory::Other {
                return Err(ClientError::Config(format!(
                    "trigger {i} maps to category 'other'"
                )));
            }
        }
        Ok(())
    }

    pub fn classifier(&self) -> FailureClassifier {
        FailureClassifier::new(self.triggers.clone())
    }
}
