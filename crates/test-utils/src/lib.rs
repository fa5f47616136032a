//! Shared fixtures for `packspec-core`'s test suites: builders for the
//! repository-index snapshot, packaging groups, and composed specs that
//! would otherwise be repeated, inline, in every test module.

use std::collections::HashMap;

use packspec_core::index::{AptVersionRecord, RepoIndex, RepoIndexDocument};
use packspec_core::model::{Constraint, Dependency, Ecosystem, Op, PackagingGroup, PackagingMode, Pattern};

/// Builds a [`RepoIndex`] from `(name, versions)` pairs for the `pip`
/// ecosystem and `(name, versions)` pairs for the `apt` ecosystem (plain
/// version lists only, no dependency metadata).
pub fn flat_index(pip: &[(&str, &[&str])], apt: &[(&str, &[&str])]) -> RepoIndex {
    let pip = pip
        .iter()
        .map(|(name, versions)| ((*name).to_string(), versions.iter().map(|v| v.to_string()).collect()))
        .collect();
    let apt = apt
        .iter()
        .map(|(name, versions)| ((*name).to_string(), versions.iter().map(|v| v.to_string()).collect()))
        .collect();
    RepoIndex::from_document(RepoIndexDocument {
        pip,
        apt,
        apt_packages: HashMap::new(),
    })
}

/// Builds a [`RepoIndex`] with full Debian dependency metadata, for SAT
/// solver fixtures. `packages` maps a package name to its version records.
pub fn apt_packages_index(packages: Vec<(&str, Vec<AptVersionRecord>)>) -> RepoIndex {
    let apt_packages = packages
        .into_iter()
        .map(|(name, records)| (name.to_string(), records))
        .collect();
    RepoIndex::from_document(RepoIndexDocument {
        pip: HashMap::new(),
        apt: HashMap::new(),
        apt_packages,
    })
}

/// Builds one [`AptVersionRecord`] with `depends`/`pre_depends`/`provides`
/// given as raw relation strings.
pub fn apt_record(version: &str, depends: &[&str], provides: &[&str]) -> AptVersionRecord {
    AptVersionRecord {
        version: version.to_string(),
        depends: depends.iter().map(|s| s.to_string()).collect(),
        pre_depends: vec![],
        provides: provides.iter().map(|s| s.to_string()).collect(),
    }
}

/// Builds a single-constraint [`Dependency`] with a terse call shape for
/// test bodies: `dep("apt", "libfoo", Op::Ge, Some("1.0.0"), "product:manual")`.
pub fn dep(
    ecosystem: Ecosystem,
    name: &str,
    op: Op,
    version: Option<&str>,
    source: &str,
) -> Dependency {
    Dependency::new(
        name,
        ecosystem,
        Constraint {
            name: name.to_string(),
            op,
            version: version.map(str::to_string),
            source: source.to_string(),
        },
    )
}

/// A catch-all packaging group that matches every dependency for a given
/// target environment, packaged individually. The default group most
/// resolver-focused tests need and don't want to restate.
pub fn catch_all_group(target: &str) -> PackagingGroup {
    PackagingGroup {
        name: "catch-all".to_string(),
        mode: PackagingMode::Individual,
        scope: target.to_string(),
        matches: vec![Pattern::Any],
        targets: vec![target.to_string()],
        pins: vec![],
    }
}
