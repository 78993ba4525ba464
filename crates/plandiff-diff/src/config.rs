use std::path::Path;

use plandiff_model::{Field, MATCH_FIELDS};
use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Settings consumed by the diff engines.
///
/// Loadable from TOML:
///
/// ```toml
/// hash_fields = ["name", "planned_start", "planned_finish"]
/// whole_days = true
/// legacy_attributes = ["name", "planned_finish"]
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiffConfig {
    /// Attributes folded into subtree fingerprints for the tree matcher.
    pub hash_fields: Vec<Field>,
    /// Flat differ only: timestamps on the same calendar date compare equal.
    pub whole_days: bool,
    /// Flat differ only: attributes whose changes are reported.
    pub legacy_attributes: Vec<Field>,
}

impl Default for DiffConfig {
    fn default() -> Self {
        let mut legacy_attributes = MATCH_FIELDS.to_vec();
        legacy_attributes.push(Field::Milestone);
        Self {
            hash_fields: MATCH_FIELDS.to_vec(),
            whole_days: false,
            legacy_attributes,
        }
    }
}

impl DiffConfig {
    /// Parse a TOML document. Missing keys take their defaults.
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML config file.
    pub fn load(path: &Path) -> DiffResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> DiffResult<()> {
        if self.hash_fields.is_empty() {
            return Err(DiffError::Config("hash_fields must name at least one field".into()));
        }
        Ok(())
    }

    /// Returns `true` if the flat differ should report changes to `name`.
    pub fn reports_attribute(&self, name: &str) -> bool {
        self.legacy_attributes.iter().any(|f| f.as_str() == name)
    }
}
