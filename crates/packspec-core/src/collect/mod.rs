//! Dependency collection: gathers constraints from the three input sources
//! (manual spec entries, typed export tags, abstract tags) and applies
//! workspace-internal-name filtering.

pub mod manifest;
pub mod scan;

use std::collections::{HashMap, HashSet};

use tracing::warn;

use crate::compose::{ComposedSpec, SchemaEntry};
use crate::constraint::parse_constraint;
use crate::error::PackspecError;
use crate::model::{Constraint, Dependency, Ecosystem};

pub use manifest::{parse_manifest, AbstractTag, Manifest, Scope, TypedExport};
pub use scan::scan_workspace;

/// Controls whether collection drops dependencies whose name resolves to a
/// package already present in the workspace being scanned.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollectOptions {
    /// When `true`, typed and abstract entries naming a workspace package
    /// are dropped rather than collected.
    pub exclude_workspace_internal: bool,
}

/// The result of collection: every gathered dependency, plus any abstract
/// tag keys that the schema could not resolve.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollectResult {
    /// Collected dependencies, not yet merged by key.
    pub dependencies: Vec<Dependency>,
    /// Abstract tag keys with no schema entry, logged but not fatal.
    pub unresolved: Vec<String>,
}

fn parse_manual_entry(text: &str, source: &str) -> Result<Dependency, PackspecError> {
    let (eco, rest) = text.trim().split_once(':').ok_or_else(|| {
        PackspecError::invalid_argument(format!(
            "manual entry '{text}' is missing an 'ecosystem:' prefix"
        ))
    })?;
    let ecosystem: Ecosystem = eco.parse()?;
    let constraint = parse_constraint(rest, source)?;
    let name = constraint.name.clone();
    Ok(Dependency::new(name, ecosystem, constraint))
}

/// Builds the set of name variants a workspace manifest's own package name
/// is recognized under: the bare name, a `ros-` prefixed form, the
/// `_`-to-`-` translated form, and both combined.
fn workspace_name_variants(manifests: &[Manifest]) -> HashSet<String> {
    let mut names = HashSet::new();
    for manifest in manifests {
        let dashed = manifest.name.replace('_', "-");
        names.insert(manifest.name.clone());
        names.insert(format!("ros-{}", manifest.name));
        names.insert(dashed.clone());
        names.insert(format!("ros-{dashed}"));
    }
    names
}

fn typed_constraint_text(entry: &TypedExport) -> String {
    match &entry.version {
        Some(version) => format!("{}{}", entry.name, version),
        None => entry.name.clone(),
    }
}

fn schema_constraint_text(entry: &SchemaEntry) -> String {
    match &entry.version {
        Some(version) => format!("{}{}", entry.package, version),
        None => entry.package.clone(),
    }
}

/// Gathers dependencies from `composed`'s manual entries and from
/// `manifests`' typed export and abstract tags, resolving abstract keys
/// through `schema`.
pub fn collect(
    composed: &ComposedSpec,
    manifests: &[Manifest],
    schema: &HashMap<String, SchemaEntry>,
    options: CollectOptions,
) -> Result<CollectResult, PackspecError> {
    let mut dependencies = Vec::new();
    let mut unresolved = Vec::new();

    for entry in &composed.manual {
        dependencies.push(parse_manual_entry(&entry.text, &entry.source)?);
    }

    let internal_names = if options.exclude_workspace_internal {
        Some(workspace_name_variants(manifests))
    } else {
        None
    };
    let is_internal = |name: &str| internal_names.as_ref().is_some_and(|n| n.contains(name));

    for manifest in manifests {
        for typed in &manifest.typed {
            if is_internal(&typed.name) {
                continue;
            }
            let source = "package_xml:export";
            let constraint = parse_constraint(&typed_constraint_text(typed), source)?;
            dependencies.push(Dependency::new(typed.name.clone(), typed.ecosystem, constraint));
        }

        let mut seen_keys = HashSet::new();
        for tag in &manifest.abstract_tags {
            if !seen_keys.insert(tag.key.clone()) {
                continue;
            }
            match schema.get(&tag.key) {
                Some(entry) => {
                    if is_internal(&entry.package) {
                        continue;
                    }
                    let ecosystem: Ecosystem = entry.ecosystem.parse()?;
                    let source = format!("schema:{}", tag.key);
                    let constraint = parse_constraint(&schema_constraint_text(entry), source)?;
                    dependencies.push(Dependency::new(entry.package.clone(), ecosystem, constraint));
                }
                None => {
                    warn!(key = %tag.key, "unresolved abstract dependency tag");
                    unresolved.push(tag.key.clone());
                }
            }
        }
    }

    Ok(CollectResult {
        dependencies,
        unresolved,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compose::ManualEntry;

    fn manifest(name: &str) -> Manifest {
        Manifest {
            name: name.to_string(),
            typed: vec![],
            abstract_tags: vec![],
        }
    }

    #[test]
    fn manual_entries_require_an_ecosystem_prefix() {
        let err = parse_manual_entry("libfoo>=1.0.0", "product:manual").unwrap_err();
        assert!(matches!(err, PackspecError::InvalidArgument(_)));
    }

    #[test]
    fn manual_entries_parse_ecosystem_and_constraint() {
        let dep = parse_manual_entry("apt:libfoo>=1.0.0", "product:manual").unwrap();
        assert_eq!(dep.ecosystem, Ecosystem::Apt);
        assert_eq!(dep.name, "libfoo");
        assert_eq!(dep.constraints[0].version.as_deref(), Some("1.0.0"));
    }

    #[test]
    fn workspace_internal_filtering_drops_typed_and_abstract_matches() {
        let mut composed = ComposedSpec::default();
        composed.manual.push(ManualEntry {
            text: "apt:external-lib>=1.0".into(),
            source: "product:manual".into(),
        });

        let mut internal = manifest("my_robot_driver");
        internal.typed.push(TypedExport {
            ecosystem: Ecosystem::Apt,
            name: "ros-my-robot-driver".into(),
            version: None,
        });
        internal.abstract_tags.push(AbstractTag {
            key: "ros_base".into(),
            scope: Scope::Exec,
        });

        let schema = HashMap::from([(
            "ros_base".to_string(),
            SchemaEntry {
                ecosystem: "apt".into(),
                package: "my-robot-driver".into(),
                version: None,
            },
        )]);

        let result = collect(
            &composed,
            &[internal],
            &schema,
            CollectOptions {
                exclude_workspace_internal: true,
            },
        )
        .unwrap();

        assert_eq!(result.dependencies.len(), 1);
        assert_eq!(result.dependencies[0].name, "external-lib");
        assert!(result.unresolved.is_empty());
    }

    #[test]
    fn unresolved_abstract_keys_are_recorded_not_fatal() {
        let composed = ComposedSpec::default();
        let mut m = manifest("other_pkg");
        m.abstract_tags.push(AbstractTag {
            key: "missing_key".into(),
            scope: Scope::All,
        });
        let result = collect(&composed, &[m], &HashMap::new(), CollectOptions::default()).unwrap();
        assert_eq!(result.unresolved, vec!["missing_key".to_string()]);
        assert!(result.dependencies.is_empty());
    }

    #[test]
    fn abstract_tag_keys_are_deduplicated_per_manifest() {
        let composed = ComposedSpec::default();
        let mut m = manifest("pkg");
        m.abstract_tags.push(AbstractTag {
            key: "ros_base".into(),
            scope: Scope::Build,
        });
        m.abstract_tags.push(AbstractTag {
            key: "ros_base".into(),
            scope: Scope::Exec,
        });
        let schema = HashMap::from([(
            "ros_base".to_string(),
            SchemaEntry {
                ecosystem: "apt".into(),
                package: "ros-base".into(),
                version: None,
            },
        )]);
        let result = collect(&composed, &[m], &schema, CollectOptions::default()).unwrap();
        assert_eq!(result.dependencies.len(), 1);
    }
}
