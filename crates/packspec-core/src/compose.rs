//! The spec composer: validates and merges a product spec with its
//! profiles under a deterministic set of rules.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::PackspecError;
use crate::model::{Directive, PackagingGroup};

/// The closed set of spec kinds. A product references profiles; a profile
/// never references anything further (profile nesting is not supported).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecKind {
    /// The top-level spec. Must declare a non-empty profile-reference list.
    Product,
    /// A reusable layer merged under a product.
    Profile,
}

/// A reference to a profile by `(name, version)`, irrespective of where the
/// profile's content actually comes from (local disk, a remote fetch, or an
/// inline block) — that distinction belongs to the out-of-scope profile
/// source adapter, not to the composer.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProfileRef {
    /// The profile's name.
    pub name: String,
    /// The profile's version.
    pub version: String,
}

/// A single-valued publish block. `product` always wins this field during
/// composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishBlock {
    /// The destination repository name.
    pub repository: Option<String>,
    /// The destination channel name.
    pub channel: Option<String>,
}

/// A schema-mapping entry: `abstract_key -> (ecosystem, concrete_name,
/// optional_version_spec)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaEntry {
    /// The concrete ecosystem this abstract key resolves to.
    pub ecosystem: String,
    /// The concrete package name.
    pub package: String,
    /// An optional constraint string appended to the resolved dependency.
    pub version: Option<String>,
}

/// One layer: either the product spec or a profile spec, before
/// composition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spec {
    /// Which kind of layer this is.
    #[serde(default)]
    pub kind: Option<SpecKind>,
    /// This layer's own name (used for profiles; informational on products).
    pub name: String,
    /// This layer's own version (used for profile uniqueness checks).
    pub version: String,
    /// The profiles a product references, in precedence order.
    #[serde(default)]
    pub profile_refs: Vec<ProfileRef>,
    /// Manual constraint-string entries.
    #[serde(default)]
    pub manual: Vec<String>,
    /// Resolution directives declared at this layer.
    #[serde(default)]
    pub directives: Vec<Directive>,
    /// Packaging groups declared at this layer.
    #[serde(default)]
    pub packaging_groups: Vec<PackagingGroup>,
    /// Schema-mapping entries declared at this layer.
    #[serde(default)]
    pub schema: Option<HashMap<String, SchemaEntry>>,
    /// The publish block, if any.
    #[serde(default)]
    pub publish: Option<PublishBlock>,
}

/// A manual constraint-string entry, tagged with the layer it was declared
/// in. The tag carries the `product:`/`profile:` prefix the resolver's
/// priority filter keys on (`spec.md` §3, §4.6).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManualEntry {
    /// The raw constraint string, parsed later by [`crate::constraint`].
    pub text: String,
    /// `product:manual` for the product layer, `profile:<name>:manual` for
    /// a profile layer — both satisfy the priority filter's
    /// `starts_with("product:")` / `starts_with("profile:")` checks.
    pub source: String,
}

/// The fully merged specification fed to dependency collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedSpec {
    /// All manual entries, profiles first, product last.
    pub manual: Vec<ManualEntry>,
    /// All resolution directives, profiles first, product last.
    pub directives: Vec<Directive>,
    /// All packaging groups, profiles first, product last. Names are
    /// globally unique.
    pub packaging_groups: Vec<PackagingGroup>,
    /// The union of all schema layers, later layers overriding earlier ones
    /// per key.
    pub schema: HashMap<String, SchemaEntry>,
    /// The product's publish block (product always wins).
    pub publish: PublishBlock,
}

/// Composes `product` with `profiles`, in the order they should be merged
/// (profile precedence order, product last).
///
/// # Errors
/// - [`PackspecError::InvalidArgument`] if `product` is not a `Product` spec,
///   declares no profile references, or any `profiles` entry is not a
///   `Profile` spec.
/// - [`PackspecError::AlreadyExists`] on a duplicate `(name, version)`
///   profile reference or a duplicate packaging-group name after
///   concatenation.
#[instrument(skip(product, profiles), fields(product = %product.name))]
pub fn compose(product: &Spec, profiles: &[Spec]) -> Result<ComposedSpec, PackspecError> {
    if product.kind != Some(SpecKind::Product) {
        return Err(PackspecError::invalid_argument(
            "the primary spec must have kind `product`",
        ));
    }
    if product.profile_refs.is_empty() {
        return Err(PackspecError::invalid_argument(
            "a product spec must declare a non-empty profile-reference list",
        ));
    }

    let mut seen_refs = std::collections::HashSet::new();
    for reference in &product.profile_refs {
        if !seen_refs.insert((reference.name.clone(), reference.version.clone())) {
            return Err(PackspecError::already_exists(format!(
                "duplicate profile reference {}@{}",
                reference.name, reference.version
            )));
        }
    }

    for profile in profiles {
        if profile.kind != Some(SpecKind::Profile) {
            return Err(PackspecError::invalid_argument(format!(
                "profile '{}' must have kind `profile`",
                profile.name
            )));
        }
    }

    let mut acc = ComposedSpec::default();
    let total = profiles.len() + 1;
    for (i, layer) in profiles.iter().chain(std::iter::once(product)).enumerate() {
        merge_layer(&mut acc, layer, i + 1 == total)?;
    }

    let mut names = std::collections::HashSet::new();
    for group in &acc.packaging_groups {
        if !names.insert(group.name.clone()) {
            return Err(PackspecError::already_exists(format!(
                "duplicate packaging group name '{}'",
                group.name
            )));
        }
    }

    Ok(acc)
}

fn merge_layer(
    acc: &mut ComposedSpec,
    layer: &Spec,
    is_product: bool,
) -> Result<(), PackspecError> {
    let source = if is_product {
        "product:manual".to_string()
    } else {
        format!("profile:{}:manual", layer.name)
    };
    acc.manual.extend(layer.manual.iter().cloned().map(|text| ManualEntry {
        text,
        source: source.clone(),
    }));
    acc.directives.extend(layer.directives.iter().cloned());
    acc.packaging_groups
        .extend(layer.packaging_groups.iter().cloned());
    if let Some(schema) = &layer.schema {
        for (key, entry) in schema {
            acc.schema.insert(key.clone(), entry.clone());
        }
    }
    if is_product {
        if let Some(publish) = &layer.publish {
            acc.publish = publish.clone();
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(name: &str) -> Spec {
        Spec {
            kind: Some(SpecKind::Profile),
            name: name.to_string(),
            version: "1.0.0".to_string(),
            ..Default::default()
        }
    }

    fn product() -> Spec {
        Spec {
            kind: Some(SpecKind::Product),
            name: "acme-robot".to_string(),
            version: "1.0.0".to_string(),
            profile_refs: vec![ProfileRef {
                name: "base".to_string(),
                version: "1.0.0".to_string(),
            }],
            ..Default::default()
        }
    }

    #[test]
    fn product_must_declare_profiles() {
        let mut p = product();
        p.profile_refs.clear();
        assert!(compose(&p, &[profile("base")]).is_err());
    }

    #[test]
    fn product_wins_publish_block() {
        let mut base = profile("base");
        base.publish = Some(PublishBlock {
            repository: Some("profile-repo".into()),
            channel: None,
        });
        let mut prod = product();
        prod.publish = Some(PublishBlock {
            repository: Some("product-repo".into()),
            channel: Some("stable".into()),
        });
        let composed = compose(&prod, &[base]).unwrap();
        assert_eq!(composed.publish.repository.as_deref(), Some("product-repo"));
        assert_eq!(composed.publish.channel.as_deref(), Some("stable"));
    }

    #[test]
    fn list_fields_concatenate_profiles_then_product() {
        let mut base = profile("base");
        base.manual.push("libfoo".into());
        let mut prod = product();
        prod.manual.push("libbar".into());
        let composed = compose(&prod, &[base]).unwrap();
        let texts: Vec<&str> = composed.manual.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["libfoo", "libbar"]);
        assert_eq!(composed.manual[0].source, "profile:base:manual");
        assert_eq!(composed.manual[1].source, "product:manual");
    }

    #[test]
    fn duplicate_packaging_group_names_fail() {
        let group = PackagingGroup {
            name: "dup".into(),
            mode: crate::model::PackagingMode::Individual,
            scope: "robot".into(),
            matches: vec![],
            targets: vec![],
            pins: vec![],
        };
        let mut base = profile("base");
        base.packaging_groups.push(group.clone());
        let mut prod = product();
        prod.packaging_groups.push(group);
        assert!(compose(&prod, &[base]).is_err());
    }

    #[test]
    fn schema_merge_is_last_layer_wins_per_key() {
        let mut base = profile("base");
        base.schema = Some(HashMap::from([(
            "ros".to_string(),
            SchemaEntry {
                ecosystem: "apt".into(),
                package: "ros-base".into(),
                version: None,
            },
        )]));
        let mut prod = product();
        prod.schema = Some(HashMap::from([(
            "ros".to_string(),
            SchemaEntry {
                ecosystem: "apt".into(),
                package: "ros-noetic-base".into(),
                version: None,
            },
        )]));
        let composed = compose(&prod, &[base]).unwrap();
        assert_eq!(composed.schema["ros"].package, "ros-noetic-base");
    }
}
