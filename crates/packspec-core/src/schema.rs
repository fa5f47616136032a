//! The external schema-mapping file format: `abstract_key -> (ecosystem,
//! concrete_name, optional_version_spec)`, loaded in layers where a later
//! layer overrides an earlier one per key. This is the engine's extension
//! point — new abstract-to-concrete mappings ship as additional layers
//! without any engine change.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::compose::SchemaEntry;
use crate::error::PackspecError;

/// The on-disk shape of one schema-mapping file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaFile {
    /// A non-empty version tag for this schema layer.
    pub schema_version: String,
    /// An optional target-environment scope for this layer.
    #[serde(default)]
    pub target: Option<String>,
    /// The `abstract_key -> concrete mapping` table.
    #[serde(default)]
    pub mappings: HashMap<String, RawSchemaEntry>,
}

/// The wire shape of one mapping entry, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawSchemaEntry {
    /// Must be `"apt"` or `"pip"`.
    #[serde(rename = "type")]
    pub ecosystem_type: String,
    /// The concrete package name. Must be non-empty.
    pub package: String,
    /// An optional constraint string.
    #[serde(default)]
    pub version: Option<String>,
}

impl SchemaFile {
    /// Parses and validates a schema file from `reader`.
    ///
    /// Fails with [`PackspecError::InvalidArgument`] when `schema_version`
    /// is empty, or any mapping has an unknown `type` or an empty
    /// `package`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, PackspecError> {
        let file: SchemaFile = serde_json::from_reader(reader).map_err(|e| {
            PackspecError::invalid_argument(format!("malformed schema file: {e}"))
        })?;
        file.validate()?;
        Ok(file)
    }

    fn validate(&self) -> Result<(), PackspecError> {
        if self.schema_version.trim().is_empty() {
            return Err(PackspecError::invalid_argument(
                "schema file has an empty schema_version",
            ));
        }
        for (key, entry) in &self.mappings {
            if entry.ecosystem_type != "apt" && entry.ecosystem_type != "pip" {
                return Err(PackspecError::invalid_argument(format!(
                    "schema mapping '{key}' has unknown type '{}'",
                    entry.ecosystem_type
                )));
            }
            if entry.package.trim().is_empty() {
                return Err(PackspecError::invalid_argument(format!(
                    "schema mapping '{key}' has an empty package"
                )));
            }
        }
        Ok(())
    }

    fn into_entries(self) -> HashMap<String, SchemaEntry> {
        self.mappings
            .into_iter()
            .map(|(key, raw)| {
                (
                    key,
                    SchemaEntry {
                        ecosystem: raw.ecosystem_type,
                        package: raw.package,
                        version: raw.version,
                    },
                )
            })
            .collect()
    }
}

/// Merges schema layers in order: a later layer overrides an earlier one
/// per key. This is the same merge rule the spec composer applies to
/// per-spec `schema` blocks (§4.3), exposed standalone for layering
/// external schema *files*.
pub fn merge_layers(layers: Vec<SchemaFile>) -> HashMap<String, SchemaEntry> {
    let mut merged = HashMap::new();
    for layer in layers {
        merged.extend(layer.into_entries());
    }
    merged
}

#[cfg(test)]
mod tests {
    use super::*;

    fn file(version: &str, key: &str, ty: &str, package: &str) -> SchemaFile {
        SchemaFile {
            schema_version: version.to_string(),
            target: None,
            mappings: HashMap::from([(
                key.to_string(),
                RawSchemaEntry {
                    ecosystem_type: ty.to_string(),
                    package: package.to_string(),
                    version: None,
                },
            )]),
        }
    }

    #[test]
    fn rejects_empty_schema_version() {
        let f = file("", "ros", "apt", "ros-base");
        assert!(f.validate().is_err());
    }

    #[test]
    fn rejects_unknown_type() {
        let f = file("1", "ros", "npm", "ros-base");
        assert!(f.validate().is_err());
    }

    #[test]
    fn later_layer_overrides_earlier_per_key() {
        let a = file("1", "ros", "apt", "ros-base");
        let b = file("2", "ros", "apt", "ros-noetic-base");
        let merged = merge_layers(vec![a, b]);
        assert_eq!(merged["ros"].package, "ros-noetic-base");
    }
}
