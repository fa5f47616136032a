//! The data model shared by every component: ecosystems, constraints,
//! dependencies, packaging groups, directives, and the three output record
//! kinds. Everything here is immutable once constructed — components build
//! new values rather than mutating existing ones.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PackspecError;

/// The closed set of ecosystems this engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Ecosystem {
    /// The Debian package ecosystem.
    Apt,
    /// The Python package ecosystem.
    Pip,
}

impl fmt::Display for Ecosystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Ecosystem::Apt => "apt",
            Ecosystem::Pip => "pip",
        })
    }
}

impl FromStr for Ecosystem {
    type Err = PackspecError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apt" => Ok(Ecosystem::Apt),
            "pip" => Ok(Ecosystem::Pip),
            other => Err(PackspecError::invalid_argument(format!(
                "unknown ecosystem '{other}'"
            ))),
        }
    }
}

/// Normalizes a pip package name per
/// [PEP 503](https://peps.python.org/pep-0503/#normalized-names): lowercase,
/// with runs of `-`, `_`, `.` collapsed to a single `-`.
pub fn normalize_pip_name(name: &str) -> String {
    static RUN: once_cell::sync::Lazy<regex::Regex> =
        once_cell::sync::Lazy::new(|| regex::Regex::new(r"[-_.]+").unwrap());
    RUN.replace_all(name, "-").to_ascii_lowercase()
}

/// Normalizes a name the way Debian package names are normalized when
/// derived from another ecosystem's name: lowercase, `_` replaced with `-`.
pub fn normalize_debian_name(name: &str) -> String {
    name.to_ascii_lowercase().replace('_', "-")
}

/// The comparison operator of a [`Constraint`]. `NONE` denotes a bare-name
/// request with no version predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Op {
    /// `=` or `==`, semantically identical.
    Eq,
    /// `!=`
    Ne,
    /// `~=`, PEP 440 compatible release (unused for apt).
    Compatible,
    /// `>=`
    Ge,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `<`
    Lt,
    /// No version predicate at all.
    None,
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Op::Eq => "==",
            Op::Ne => "!=",
            Op::Compatible => "~=",
            Op::Ge => ">=",
            Op::Le => "<=",
            Op::Gt => ">",
            Op::Lt => "<",
            Op::None => "",
        })
    }
}

/// A single constraint: `(name, op, version, source)`.
///
/// `source` is a free-form tag. The prefixes `product:`, `profile:`,
/// `package_xml:`, `packaging:pin`, `resolution:force`, `schema:*`, and
/// `manual:*` carry meaning for the resolver's priority filter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constraint {
    /// The dependency name this constraint applies to.
    pub name: String,
    /// The comparison operator.
    pub op: Op,
    /// The version operand. `None` iff `op` is [`Op::None`].
    pub version: Option<String>,
    /// Where this constraint came from.
    pub source: String,
}

impl Constraint {
    /// Returns the constraint's priority class, per the resolver's
    /// three-tier filter: `product:*` = 3, `profile:*` = 2,
    /// `package_xml:*` = 1, everything else = 0.
    pub fn priority_class(&self) -> u8 {
        if self.source.starts_with("product:") {
            3
        } else if self.source.starts_with("profile:") {
            2
        } else if self.source.starts_with("package_xml:") {
            1
        } else {
            0
        }
    }
}

/// A dependency: a name, its ecosystem, and the constraints collected for
/// it. Invariant: every `constraint.name` equals `name`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    /// The dependency's name, in its ecosystem's own spelling.
    pub name: String,
    /// Which ecosystem this dependency belongs to.
    pub ecosystem: Ecosystem,
    /// All constraints collected for this dependency so far.
    pub constraints: Vec<Constraint>,
}

impl Dependency {
    /// Constructs a dependency with a single constraint.
    pub fn new(name: impl Into<String>, ecosystem: Ecosystem, constraint: Constraint) -> Self {
        Self {
            name: name.into(),
            ecosystem,
            constraints: vec![constraint],
        }
    }

    /// The typed `(ecosystem, name)` key used to merge and look up
    /// dependencies, with pip names normalized per PEP 503.
    pub fn key(&self) -> DependencyKey {
        DependencyKey::new(self.ecosystem, &self.name)
    }
}

/// The typed key `ecosystem:name` used to key the directive table and to
/// merge collected dependencies. `pip` names are normalized.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DependencyKey {
    /// The ecosystem half of the key.
    pub ecosystem: Ecosystem,
    /// The normalized name half of the key.
    pub name: String,
}

impl PartialOrd for Ecosystem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Ecosystem {
    fn cmp(&self, other: &Self) -> Ordering {
        self.to_string().cmp(&other.to_string())
    }
}

impl DependencyKey {
    /// Builds a key, normalizing `name` when `ecosystem` is `pip`.
    pub fn new(ecosystem: Ecosystem, name: &str) -> Self {
        let name = match ecosystem {
            Ecosystem::Pip => normalize_pip_name(name),
            Ecosystem::Apt => name.to_string(),
        };
        Self { ecosystem, name }
    }

    /// Parses a `ecosystem:name` typed key, as used by the directive table.
    pub fn parse(raw: &str) -> Result<Self, PackspecError> {
        let (eco, name) = raw.split_once(':').ok_or_else(|| {
            PackspecError::invalid_argument(format!("malformed dependency key '{raw}'"))
        })?;
        Ok(Self::new(eco.parse()?, name))
    }
}

impl fmt::Display for DependencyKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ecosystem, self.name)
    }
}

/// The packaging mode a [`PackagingGroup`] assigns to the dependencies that
/// route to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackagingMode {
    /// One deliverable per resolved dependency.
    Individual,
    /// Individual deliverables plus one metadata-only aggregate that pins
    /// them.
    MetaBundle,
    /// A single self-contained deliverable, no package-level links.
    FatBundle,
}

impl fmt::Display for PackagingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PackagingMode::Individual => "individual",
            PackagingMode::MetaBundle => "meta-bundle",
            PackagingMode::FatBundle => "fat-bundle",
        })
    }
}

/// A packaging-group match pattern, one of the five shapes described in the
/// packaging policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pattern {
    /// `*` — matches any dependency in any ecosystem.
    Any,
    /// `<ecosystem>:*` — matches any dependency within one ecosystem.
    EcosystemAny(Ecosystem),
    /// `<ecosystem>:<name>` (ecosystem optional) — an exact name match.
    Exact {
        /// `None` means the pattern applies regardless of ecosystem.
        ecosystem: Option<Ecosystem>,
        /// The exact name to match.
        name: String,
    },
    /// `<ecosystem>:<prefix>*` (ecosystem optional) — a prefix match.
    Prefix {
        /// `None` means the pattern applies regardless of ecosystem.
        ecosystem: Option<Ecosystem>,
        /// The prefix, without the trailing `*`.
        prefix: String,
    },
}

impl Pattern {
    /// Parses one pattern string per the five shapes the packaging policy
    /// recognizes.
    pub fn parse(raw: &str) -> Result<Self, PackspecError> {
        if raw == "*" {
            return Ok(Pattern::Any);
        }
        let (ecosystem, rest) = match raw.split_once(':') {
            Some((eco, rest)) => (Some(eco.parse::<Ecosystem>()?), rest),
            None => (None, raw),
        };
        if rest == "*" {
            return match ecosystem {
                Some(eco) => Ok(Pattern::EcosystemAny(eco)),
                None => Ok(Pattern::Any),
            };
        }
        if let Some(prefix) = rest.strip_suffix('*') {
            if prefix.is_empty() {
                return Err(PackspecError::invalid_argument(format!(
                    "empty prefix pattern '{raw}'"
                )));
            }
            return Ok(Pattern::Prefix {
                ecosystem,
                prefix: prefix.to_string(),
            });
        }
        if rest.is_empty() {
            return Err(PackspecError::invalid_argument(format!(
                "empty pattern '{raw}'"
            )));
        }
        Ok(Pattern::Exact {
            ecosystem,
            name: rest.to_string(),
        })
    }

    /// The match priority used to break ties between simultaneously
    /// matching patterns: exact (2) > prefix (1) > wildcard (0).
    pub fn specificity(&self) -> u8 {
        match self {
            Pattern::Exact { .. } => 2,
            Pattern::Prefix { .. } => 1,
            Pattern::EcosystemAny(_) | Pattern::Any => 0,
        }
    }

    /// Returns `true` if this pattern matches `(ecosystem, name)`.
    pub fn matches(&self, ecosystem: Ecosystem, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::EcosystemAny(eco) => *eco == ecosystem,
            Pattern::Exact {
                ecosystem: pat_eco,
                name: pat_name,
            } => pat_eco.map_or(true, |e| e == ecosystem) && pat_name == name,
            Pattern::Prefix {
                ecosystem: pat_eco,
                prefix,
            } => pat_eco.map_or(true, |e| e == ecosystem) && name.starts_with(prefix.as_str()),
        }
    }
}

/// A packaging policy rule binding a set of dependency patterns to a mode,
/// target-environment scope, and optional version pins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackagingGroup {
    /// The group's name. Must be globally unique after spec composition.
    pub name: String,
    /// The packaging mode this group assigns.
    pub mode: PackagingMode,
    /// A free-form scope tag carried through to the bundle manifest.
    pub scope: String,
    /// The patterns that route a dependency to this group.
    pub matches: Vec<Pattern>,
    /// The target environments this group applies to.
    pub targets: Vec<String>,
    /// Extra constraint strings appended to every dependency that routes to
    /// this group.
    pub pins: Vec<String>,
}

/// An authored override for one dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Directive {
    /// The typed dependency key this directive targets.
    pub dependency: DependencyKey,
    /// What the directive does.
    pub action: DirectiveAction,
    /// The operand for `force`/`replace`; ignored by `relax`/`block`.
    pub value: Option<String>,
    /// Why this override exists.
    pub reason: String,
    /// Who authored the override.
    pub owner: String,
    /// An optional expiry timestamp, opaque to the engine.
    pub expires_at: Option<String>,
}

/// The action an applied [`Directive`] takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DirectiveAction {
    /// Replace the dependency's constraints with a single `==value`.
    Force,
    /// Clear all constraints.
    Relax,
    /// Rewrite the dependency's name to `value`, clearing constraints.
    Replace,
    /// Fail resolution for this dependency.
    Block,
}

/// An immutable commitment to a specific `(package, version)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    /// The final, ecosystem-projected package name.
    pub package_name: String,
    /// The resolved version string.
    pub version: String,
}

impl PartialOrd for LockRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for LockRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        self.package_name.cmp(&other.package_name)
    }
}

/// The per-group enumeration of a packaged dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BundleRecord {
    /// The packaging group's name.
    pub group: String,
    /// The packaging mode assigned by that group.
    pub mode: PackagingMode,
    /// The projected package name.
    pub package: String,
    /// The resolved version.
    pub version: String,
}

impl PartialOrd for BundleRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for BundleRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        (&self.group, &self.package, &self.version, self.mode.to_string()).cmp(&(
            &other.group,
            &other.package,
            &other.version,
            other.mode.to_string(),
        ))
    }
}

/// One applied directive, recorded for auditing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionRecord {
    /// The typed dependency key the directive applied to.
    pub dependency: DependencyKey,
    /// The action that was applied.
    pub action: DirectiveAction,
    /// The operand, if any.
    pub value: Option<String>,
    /// Why the override exists.
    pub reason: String,
    /// Who authored the override.
    pub owner: String,
}

impl PartialOrd for ResolutionRecord {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ResolutionRecord {
    fn cmp(&self, other: &Self) -> Ordering {
        let action_str = |a: DirectiveAction| match a {
            DirectiveAction::Force => "force",
            DirectiveAction::Relax => "relax",
            DirectiveAction::Replace => "replace",
            DirectiveAction::Block => "block",
        };
        (
            self.dependency.to_string(),
            action_str(self.action),
            self.value.as_deref().unwrap_or(""),
            self.owner.as_str(),
            self.reason.as_str(),
        )
            .cmp(&(
                other.dependency.to_string(),
                action_str(other.action),
                other.value.as_deref().unwrap_or(""),
                other.owner.as_str(),
                other.reason.as_str(),
            ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pip_name_normalization() {
        assert_eq!(normalize_pip_name("Requests"), "requests");
        assert_eq!(normalize_pip_name("foo_bar.baz"), "foo-bar-baz");
        assert_eq!(normalize_pip_name("foo--bar"), "foo-bar");
    }

    #[test]
    fn pattern_specificity_orders_exact_over_prefix_over_wildcard() {
        let exact = Pattern::parse("apt:libfoo").unwrap();
        let prefix = Pattern::parse("apt:lib*").unwrap();
        let wildcard = Pattern::parse("apt:*").unwrap();
        assert!(exact.specificity() > prefix.specificity());
        assert!(prefix.specificity() > wildcard.specificity());
    }

    #[test]
    fn dependency_key_normalizes_pip_names_only() {
        let pip = DependencyKey::new(Ecosystem::Pip, "Foo_Bar");
        assert_eq!(pip.name, "foo-bar");
        let apt = DependencyKey::new(Ecosystem::Apt, "Foo_Bar");
        assert_eq!(apt.name, "Foo_Bar");
    }
}
