//! The resolver core: merges collected dependencies by key, applies the
//! three-tier priority filter, consults directives and packaging pins, and
//! dispatches each dependency to its ecosystem-specific resolution path.

pub mod directive;

use std::collections::HashMap;

use indexmap::IndexMap;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::PackspecError;
use crate::index::RepoIndex;
use crate::model::{
    normalize_debian_name, normalize_pip_name, BundleRecord, Constraint, Dependency, DependencyKey,
    Directive, Ecosystem, LockRecord, Op, PackagingGroup, ResolutionRecord,
};
use crate::policy::{apply_pins, classify};
use crate::version::best_compatible;
use crate::version::cache::VersionCache;

/// How Debian dependencies are dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebianMode {
    /// Resolve each Debian dependency independently, the same way a Python
    /// dependency is resolved (against a flat version list).
    SinglePackage,
    /// Collect every pin-applied Debian dependency and hand them to the SAT
    /// solver as one batch.
    Sat,
}

/// Per-call resolver configuration.
#[derive(Debug, Clone, Copy)]
pub struct ResolveOptions<'a> {
    /// The target-environment tag used to select packaging groups.
    pub target: &'a str,
    /// Which Debian dispatch mode to use.
    pub debian_mode: DebianMode,
}

/// The three sorted output record lists the resolver produces.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolveOutput {
    /// One record per resolved dependency, sorted by package name.
    pub locks: Vec<LockRecord>,
    /// One record per resolved dependency per its packaging group.
    pub bundle: Vec<BundleRecord>,
    /// One record per dependency a directive actually rewrote.
    pub report: Vec<ResolutionRecord>,
}

fn merge_by_key(dependencies: Vec<Dependency>) -> IndexMap<DependencyKey, Dependency> {
    let mut merged: IndexMap<DependencyKey, Dependency> = IndexMap::new();
    for dep in dependencies {
        let key = dep.key();
        match merged.get_mut(&key) {
            Some(existing) => existing.constraints.extend(dep.constraints),
            None => {
                merged.insert(key, dep);
            }
        }
    }
    merged
}

fn build_directive_table(directives: &[Directive]) -> HashMap<DependencyKey, &Directive> {
    let mut table = HashMap::new();
    for directive in directives {
        table.insert(directive.dependency.clone(), directive);
    }
    table
}

/// Partitions `constraints` by priority class and selects the winning
/// subset per `spec.md` §4.6: the highest non-empty class wins; within it,
/// a non-`NONE` constraint suppresses the class's `NONE` ones; if the class
/// is entirely `NONE`, the highest-priority *lower* class that has a
/// non-`NONE` constraint serves as a fallback, so an unconstrained
/// higher-priority request never masks a constrained lower-priority one.
///
/// The fallback draws from exactly one class, never a union of classes —
/// pooling non-`NONE` constraints across multiple classes would make a
/// second pass see them as already the top (and only) class present and
/// prune it further, which breaks idempotence (`spec.md` §8, invariant 8).
fn filter_constraints(constraints: &[Constraint]) -> Vec<Constraint> {
    let mut by_class: [Vec<&Constraint>; 4] = Default::default();
    for constraint in constraints {
        by_class[constraint.priority_class() as usize].push(constraint);
    }
    let Some(top) = (0..=3).rev().find(|&class| !by_class[class].is_empty()) else {
        return Vec::new();
    };

    let non_none: Vec<Constraint> = by_class[top]
        .iter()
        .filter(|c| c.op != Op::None)
        .map(|c| (*c).clone())
        .collect();
    if !non_none.is_empty() {
        return non_none;
    }

    if let Some(fallback_class) =
        (0..top).rev().find(|&class| by_class[class].iter().any(|c| c.op != Op::None))
    {
        return by_class[fallback_class]
            .iter()
            .filter(|c| c.op != Op::None)
            .map(|c| (*c).clone())
            .collect();
    }

    by_class[top].iter().map(|c| (*c).clone()).collect()
}

fn lock_name(ecosystem: Ecosystem, name: &str) -> String {
    match ecosystem {
        Ecosystem::Apt => name.to_string(),
        Ecosystem::Pip => format!("python3-{}", normalize_debian_name(&normalize_pip_name(name))),
    }
}

#[allow(clippy::too_many_arguments)]
fn emit(
    locks: &mut Vec<LockRecord>,
    bundle: &mut Vec<BundleRecord>,
    report: &mut Vec<ResolutionRecord>,
    ecosystem: Ecosystem,
    name: &str,
    version: &str,
    group: &PackagingGroup,
    applied: Option<ResolutionRecord>,
) {
    let package = lock_name(ecosystem, name);
    locks.push(LockRecord {
        package_name: package.clone(),
        version: version.to_string(),
    });
    bundle.push(BundleRecord {
        group: group.name.clone(),
        mode: group.mode,
        package,
        version: version.to_string(),
    });
    if let Some(record) = applied {
        report.push(record);
    }
}

/// Resolves `name`/`constraints` against versions from `fetch_versions`,
/// retrying once through `directive` (if any) when the initial attempt is
/// unsatisfiable. Shared by the Python path and the Debian single-package
/// path — both reduce to "pick the greatest version satisfying a flat
/// constraint list, with directive-driven rewrite-and-retry on failure."
fn resolve_with_retry(
    ecosystem: Ecosystem,
    cache: &VersionCache,
    original_key: DependencyKey,
    name: &str,
    constraints: &[Constraint],
    fetch_versions: impl Fn(&str) -> Result<Vec<String>, PackspecError>,
    directive: Option<&Directive>,
) -> Result<(String, String, Option<ResolutionRecord>), PackspecError> {
    let mut current_name = name.to_string();
    let mut current_constraints = constraints.to_vec();
    let mut retried = false;

    loop {
        let versions = fetch_versions(&current_name)?;
        let pairs: Vec<(Op, Option<&str>)> = current_constraints
            .iter()
            .map(|c| (c.op, c.version.as_deref()))
            .collect();
        match best_compatible(ecosystem, cache, &pairs, &versions) {
            Ok(version) => {
                let record = if retried {
                    directive.map(|d| ResolutionRecord {
                        dependency: original_key.clone(),
                        action: d.action,
                        value: d.value.clone(),
                        reason: d.reason.clone(),
                        owner: d.owner.clone(),
                    })
                } else {
                    None
                };
                return Ok((current_name, version.to_string(), record));
            }
            Err(PackspecError::FailedPrecondition(_)) if !retried => {
                let Some(d) = directive else {
                    return Err(PackspecError::failed_precondition(format!(
                        "'{name}' is unsatisfiable and no directive applies"
                    )));
                };
                retried = true;
                let current = Dependency {
                    name: current_name.clone(),
                    ecosystem,
                    constraints: current_constraints.clone(),
                };
                let rewritten = directive::apply(&current, d)?;
                current_name = rewritten.name;
                current_constraints = rewritten.constraints;
            }
            Err(e) => return Err(e),
        }
    }
}

/// Applies a directive unconditionally (no retry) before a Debian
/// dependency enters the SAT batch, per `spec.md` §4.6's Debian/SAT path.
fn apply_directive_for_sat(
    key: &DependencyKey,
    dependency: &Dependency,
    constraints: Vec<Constraint>,
    directive_table: &HashMap<DependencyKey, &Directive>,
) -> Result<(Dependency, Option<ResolutionRecord>), PackspecError> {
    let base = Dependency {
        name: dependency.name.clone(),
        ecosystem: dependency.ecosystem,
        constraints,
    };
    let Some(directive) = directive_table.get(key) else {
        return Ok((base, None));
    };
    let rewritten = directive::apply(&base, directive)?;
    let record = ResolutionRecord {
        dependency: key.clone(),
        action: directive.action,
        value: directive.value.clone(),
        reason: directive.reason.clone(),
        owner: directive.owner.clone(),
    };
    Ok((rewritten, Some(record)))
}

/// Resolves every dependency in `dependencies` against `index`, returning
/// the three sorted output record lists.
#[instrument(skip_all, fields(count = dependencies.len(), target = options.target))]
pub fn resolve(
    dependencies: Vec<Dependency>,
    directives: &[Directive],
    groups: &[PackagingGroup],
    index: &RepoIndex,
    options: ResolveOptions<'_>,
    cancel: &CancellationToken,
) -> Result<ResolveOutput, PackspecError> {
    let merged = merge_by_key(dependencies);
    let directive_table = build_directive_table(directives);
    let version_cache = VersionCache::new();

    let mut locks = Vec::new();
    let mut bundle = Vec::new();
    let mut report = Vec::new();

    let mut sat_batch: Vec<(String, Vec<Constraint>)> = Vec::new();
    let mut sat_meta: Vec<(DependencyKey, &PackagingGroup, Option<ResolutionRecord>)> = Vec::new();

    for (key, dependency) in &merged {
        if cancel.is_cancelled() {
            return Err(PackspecError::cancelled(
                "resolution cancelled before all dependencies were processed",
            ));
        }

        let mut constraints = filter_constraints(&dependency.constraints);
        let group = classify(dependency.ecosystem, &dependency.name, options.target, groups)?;
        apply_pins(group, &dependency.name, &mut constraints)?;

        match dependency.ecosystem {
            Ecosystem::Pip => {
                let (name, version, applied) = resolve_with_retry(
                    Ecosystem::Pip,
                    &version_cache,
                    key.clone(),
                    &dependency.name,
                    &constraints,
                    |n| index.pip_versions(n),
                    directive_table.get(key).copied(),
                )?;
                emit(&mut locks, &mut bundle, &mut report, Ecosystem::Pip, &name, &version, group, applied);
            }
            Ecosystem::Apt => match options.debian_mode {
                DebianMode::SinglePackage => {
                    let (name, version, applied) = resolve_with_retry(
                        Ecosystem::Apt,
                        &version_cache,
                        key.clone(),
                        &dependency.name,
                        &constraints,
                        |n| index.apt_versions(n),
                        directive_table.get(key).copied(),
                    )?;
                    emit(&mut locks, &mut bundle, &mut report, Ecosystem::Apt, &name, &version, group, applied);
                }
                DebianMode::Sat => {
                    let (rewritten, applied) =
                        apply_directive_for_sat(key, dependency, constraints, &directive_table)?;
                    sat_batch.push((rewritten.name, rewritten.constraints));
                    sat_meta.push((key.clone(), group, applied));
                }
            },
        }
    }

    if !sat_batch.is_empty() {
        let solved = crate::satsolve::solve(&sat_batch, index, &version_cache, cancel)?;
        let mut emitted: HashMap<String, ()> = HashMap::new();

        for ((name, _), (key, group, applied)) in sat_batch.iter().zip(sat_meta.into_iter()) {
            let version = solved.get(name).ok_or_else(|| {
                PackspecError::failed_precondition(format!(
                    "SAT solver produced no version for '{name}'"
                ))
            })?;
            emit(&mut locks, &mut bundle, &mut report, key.ecosystem, name, version, group, applied);
            emitted.insert(name.clone(), ());
        }

        // The SAT model selects the full transitive closure, not merely the
        // names a caller asked for directly — alternatives and virtual
        // provides (e.g. a `mail-transport-agent` pulled in through
        // `postfix`) are variables the solver turned on too, and each still
        // needs its own lock/bundle record, classified through the same
        // packaging policy as any other Debian dependency.
        let mut transitive: Vec<(&String, &String)> = solved
            .iter()
            .filter(|(name, _)| !emitted.contains_key(*name))
            .collect();
        transitive.sort();
        for (name, version) in transitive {
            let group = classify(Ecosystem::Apt, name, options.target, groups)?;
            emit(&mut locks, &mut bundle, &mut report, Ecosystem::Apt, name, version, group, None);
        }
    }

    locks.sort();
    bundle.sort();
    report.sort();
    Ok(ResolveOutput { locks, bundle, report })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::RepoIndexDocument;
    use crate::model::{DirectiveAction, PackagingMode, Pattern};

    fn wildcard_group() -> PackagingGroup {
        PackagingGroup {
            name: "all".into(),
            mode: PackagingMode::Individual,
            scope: "robot".into(),
            matches: vec![Pattern::Any],
            targets: vec!["robot".into()],
            pins: vec![],
        }
    }

    fn constraint(name: &str, op: Op, version: Option<&str>, source: &str) -> Constraint {
        Constraint {
            name: name.to_string(),
            op,
            version: version.map(str::to_string),
            source: source.to_string(),
        }
    }

    #[test]
    fn priority_filter_prefers_highest_constrained_class() {
        let constraints = vec![
            constraint("libfoo", Op::None, None, "product:manual"),
            constraint("libfoo", Op::Ge, Some("1.0"), "profile:base:manual"),
        ];
        let result = filter_constraints(&constraints);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, "profile:base:manual");
    }

    #[test]
    fn unconstrained_higher_priority_falls_back_to_lower_constrained() {
        let constraints = vec![
            constraint("libfoo", Op::None, None, "product:manual"),
            constraint("libfoo", Op::Ge, Some("1.0"), "package_xml:export"),
        ];
        let result = filter_constraints(&constraints);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].source, "package_xml:export");
    }

    #[test]
    fn filter_constraints_is_idempotent() {
        // Regression for spec.md §8 invariant 8: a fallback that pooled
        // non-`NONE` constraints across multiple classes used to pass
        // through on a first call but get pruned down on a second, because
        // the re-filtered output looked like a single already-top class.
        let constraints = vec![
            constraint("libfoo", Op::None, None, "product:manual"),
            constraint("libfoo", Op::Ge, Some("1.0"), "package_xml:export"),
            constraint("libfoo", Op::Ge, Some("2.0"), "manual:other"),
        ];
        let once = filter_constraints(&constraints);
        let twice = filter_constraints(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn resolves_pip_dependency_end_to_end() {
        let index = RepoIndex::from_document(RepoIndexDocument {
            pip: HashMap::from([("requests".to_string(), vec!["1.0.0".to_string(), "2.0.0".to_string()])]),
            ..Default::default()
        });
        let deps = vec![Dependency::new(
            "requests",
            Ecosystem::Pip,
            constraint("requests", Op::None, None, "product:manual"),
        )];
        let groups = vec![wildcard_group()];
        let out = resolve(
            deps,
            &[],
            &groups,
            &index,
            ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(out.locks.len(), 1);
        assert_eq!(out.locks[0].package_name, "python3-requests");
        assert_eq!(out.locks[0].version, "2.0.0");
        assert!(out.report.is_empty());
    }

    #[test]
    fn force_directive_rescues_unsatisfiable_request() {
        let index = RepoIndex::from_document(RepoIndexDocument {
            apt: HashMap::from([("libfoo".to_string(), vec!["1.0.0".to_string(), "9.9.9".to_string()])]),
            ..Default::default()
        });
        let deps = vec![Dependency::new(
            "libfoo",
            Ecosystem::Apt,
            constraint("libfoo", Op::Gt, Some("100.0.0"), "product:manual"),
        )];
        let key = DependencyKey::new(Ecosystem::Apt, "libfoo");
        let directives = vec![Directive {
            dependency: key,
            action: DirectiveAction::Force,
            value: Some("9.9.9".to_string()),
            reason: "pin known-good".into(),
            owner: "team".into(),
            expires_at: None,
        }];
        let groups = vec![wildcard_group()];
        let out = resolve(
            deps,
            &directives,
            &groups,
            &index,
            ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
            &CancellationToken::new(),
        )
        .unwrap();
        assert_eq!(out.locks[0].version, "9.9.9");
        assert_eq!(out.report.len(), 1);
        assert_eq!(out.report[0].action, DirectiveAction::Force);
    }

    #[test]
    fn no_matching_packaging_group_fails_not_found() {
        let index = RepoIndex::from_document(RepoIndexDocument {
            apt: HashMap::from([("libfoo".to_string(), vec!["1.0.0".to_string()])]),
            ..Default::default()
        });
        let deps = vec![Dependency::new(
            "libfoo",
            Ecosystem::Apt,
            constraint("libfoo", Op::None, None, "product:manual"),
        )];
        let err = resolve(
            deps,
            &[],
            &[],
            &index,
            ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
            &CancellationToken::new(),
        )
        .unwrap_err();
        assert!(matches!(err, PackspecError::NotFound(_)));
    }
}
