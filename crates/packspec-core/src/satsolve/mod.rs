//! The Debian dependency solver: encodes a batch of Debian dependency
//! requests and the repository-index snapshot as a weighted-partial-MaxSAT
//! problem and solves it with `rustsat` + `rustsat-minisat`.
//!
//! `rustsat` is the real Rust MaxSAT-tooling ecosystem crate in this pack —
//! it backs the `scuttle` MaxSAT solver — and its pseudo-Boolean
//! `GeneralizedTotalizer` encoder natively supports the per-literal weights
//! this objective needs. `rustsat-minisat` supplies the incremental SAT
//! backend actually invoked at each bound.

pub mod altparse;

use std::collections::HashMap;

use itertools::Itertools;
use rustsat::encodings::pb::{BoundUpper, GeneralizedTotalizer};
use rustsat::instances::{BasicVarManager, Cnf, ManageVars};
use rustsat::solvers::{Solve, SolverResult};
use rustsat::types::{Lit, TernaryVal, Var};
use rustsat_minisat::core::Minisat;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use crate::error::PackspecError;
use crate::index::RepoIndex;
use crate::model::{Constraint, Ecosystem, Op};
use crate::version::cache::VersionCache;

type PackageVersion = (String, String);

struct VarTable {
    vars: HashMap<PackageVersion, Var>,
    manager: BasicVarManager,
}

impl VarTable {
    fn build(index: &RepoIndex) -> Self {
        let mut manager = BasicVarManager::default();
        let mut vars = HashMap::new();
        for (name, records) in index.iter_apt() {
            for record in records {
                let var = manager.new_var();
                vars.insert((name.to_string(), record.version.clone()), var);
            }
        }
        Self { vars, manager }
    }

    fn lit(&self, key: &PackageVersion) -> Option<Lit> {
        self.vars.get(key).map(|v| v.pos_lit())
    }
}

/// Candidates for one alternative-or-user constraint set: every
/// `(package, version)` pair that either *is* `name` or *provides* `name`,
/// and whose version satisfies every constraint in `constraints`.
fn matching_candidates(
    index: &RepoIndex,
    cache: &VersionCache,
    name: &str,
    constraints: &[(Op, Option<&str>)],
) -> Vec<PackageVersion> {
    let satisfies_all = |version: &str| {
        constraints
            .iter()
            .all(|(op, operand)| Ecosystem::Apt.satisfies_cached(cache, *op, version, *operand))
    };

    let mut candidates = Vec::new();
    if let Some(records) = index.apt_records(name) {
        candidates.extend(
            records
                .iter()
                .filter(|r| satisfies_all(&r.version))
                .map(|r| (name.to_string(), r.version.clone())),
        );
    }
    for (package, records) in index.iter_apt() {
        if package == name {
            continue;
        }
        candidates.extend(
            records
                .iter()
                .filter(|r| r.provides.iter().any(|p| p == name) && satisfies_all(&r.version))
                .map(|r| (package.to_string(), r.version.clone())),
        );
    }
    candidates
}

fn user_dependency_clause(
    index: &RepoIndex,
    vars: &VarTable,
    cache: &VersionCache,
    name: &str,
    constraints: &[Constraint],
) -> Result<Vec<Lit>, PackspecError> {
    let pairs: Vec<(Op, Option<&str>)> = constraints
        .iter()
        .map(|c| (c.op, c.version.as_deref()))
        .collect();
    let candidates = matching_candidates(index, cache, name, &pairs);
    if candidates.is_empty() {
        return Err(PackspecError::failed_precondition(format!(
            "no apt candidate satisfies the request for '{name}'"
        )));
    }
    Ok(candidates
        .into_iter()
        .unique()
        .filter_map(|key| vars.lit(&key))
        .collect())
}

fn transitive_clause(
    index: &RepoIndex,
    vars: &VarTable,
    cache: &VersionCache,
    owner: Lit,
    group: &str,
) -> Result<Vec<Lit>, PackspecError> {
    let alternatives = altparse::parse_alternatives(group)?;
    let mut union = Vec::new();
    for alt in &alternatives {
        let pairs = [(alt.op, alt.version.as_deref())];
        union.extend(matching_candidates(index, cache, &alt.name, &pairs));
    }
    let mut clause = vec![!owner];
    clause.extend(union.into_iter().unique().filter_map(|key| vars.lit(&key)));
    Ok(clause)
}

/// Builds the hard-clause CNF: at-most-one per package, one clause per
/// user-requested dependency, and one clause (or unit clause) per
/// `depends`/`pre_depends` relation group of every observed version.
fn encode_hard_clauses(
    index: &RepoIndex,
    vars: &VarTable,
    cache: &VersionCache,
    requests: &[(String, Vec<Constraint>)],
) -> Result<Cnf, PackspecError> {
    let mut cnf = Cnf::new();

    for (name, records) in index.iter_apt() {
        let lits: Vec<Lit> = records
            .iter()
            .filter_map(|r| vars.lit(&(name.to_string(), r.version.clone())))
            .collect();
        for (i, a) in lits.iter().enumerate() {
            for b in &lits[i + 1..] {
                cnf.add_clause(vec![!*a, !*b].into());
            }
        }
    }

    for (name, constraints) in requests {
        let clause = user_dependency_clause(index, vars, cache, name, constraints)?;
        cnf.add_clause(clause.into());
    }

    for (name, records) in index.iter_apt() {
        for record in records {
            let Some(owner) = vars.lit(&(name.to_string(), record.version.clone())) else {
                continue;
            };
            for group in record.depends.iter().chain(record.pre_depends.iter()) {
                let clause = transitive_clause(index, vars, cache, owner, group)?;
                if clause.len() == 1 {
                    // only `!owner` survived: no candidate satisfies this
                    // relation group, so this version is unusable.
                    cnf.add_clause(vec![!owner].into());
                } else {
                    cnf.add_clause(clause.into());
                }
            }
        }
    }

    Ok(cnf)
}

/// Assigns each `(package, version)` a cost equal to `len - 1 - i`, where
/// `i` is its ascending position in its package's version list — the
/// oldest version in a list carries the highest cost, the newest zero.
fn weighted_literals(index: &RepoIndex, vars: &VarTable) -> Vec<(Lit, usize)> {
    let mut weighted = Vec::new();
    for (name, records) in index.iter_apt() {
        let len = records.len();
        for (i, record) in records.iter().enumerate() {
            if let Some(lit) = vars.lit(&(name.to_string(), record.version.clone())) {
                weighted.push((lit, len - 1 - i));
            }
        }
    }
    weighted
}

/// Solves the hard-clause CNF once under an additional "total weighted cost
/// `<= bound`" constraint, encoded fresh via [`GeneralizedTotalizer`] for
/// this bound.
fn solve_at_bound(
    hard: &Cnf,
    weighted: &[(Lit, usize)],
    bound: usize,
    var_manager: &mut BasicVarManager,
) -> Result<Option<HashMap<Var, bool>>, PackspecError> {
    let mut totalizer = GeneralizedTotalizer::default();
    totalizer.extend(weighted.iter().copied());

    let mut bound_cnf = Cnf::new();
    totalizer
        .encode_ub(bound..=bound, &mut bound_cnf, var_manager)
        .map_err(|e| {
            PackspecError::failed_precondition(format!("failed to encode cost bound {bound}: {e}"))
        })?;

    let mut solver = Minisat::default();
    solver
        .add_cnf(hard.clone())
        .map_err(|e| PackspecError::failed_precondition(format!("solver rejected hard clauses: {e}")))?;
    solver
        .add_cnf(bound_cnf)
        .map_err(|e| PackspecError::failed_precondition(format!("solver rejected cost bound: {e}")))?;

    match solver
        .solve()
        .map_err(|e| PackspecError::failed_precondition(format!("solver invocation failed: {e}")))?
    {
        SolverResult::Sat => {
            let model = solver
                .full_solution()
                .map_err(|e| PackspecError::failed_precondition(format!("no model available: {e}")))?;
            let mut assignment = HashMap::new();
            for var in var_manager.vars() {
                assignment.insert(var, model.lit_value(var.pos_lit()) == TernaryVal::True);
            }
            Ok(Some(assignment))
        }
        SolverResult::Unsat => Ok(None),
        SolverResult::Interrupted => Err(PackspecError::cancelled("SAT solver was interrupted")),
    }
}

/// Solves the Debian dependency problem for a batch of user requests
/// against `index`, returning a `package -> version` map for every variable
/// selected by the minimum-cost model.
///
/// Fails with [`PackspecError::FailedPrecondition`] when `index` carries no
/// `apt_packages` metadata, when any requested name has no candidate, or
/// when no satisfying assignment exists at any cost.
#[instrument(skip(index, cache, cancel), fields(requests = requests.len()))]
pub fn solve(
    requests: &[(String, Vec<Constraint>)],
    index: &RepoIndex,
    cache: &VersionCache,
    cancel: &CancellationToken,
) -> Result<HashMap<String, String>, PackspecError> {
    if index.is_apt_packages_empty() {
        return Err(PackspecError::failed_precondition(
            "SAT mode requires an index with apt_packages metadata",
        ));
    }
    if cancel.is_cancelled() {
        return Err(PackspecError::cancelled("resolution was cancelled before SAT solving"));
    }

    let mut vars = VarTable::build(index);
    let hard = encode_hard_clauses(index, &vars, cache, requests)?;
    let weighted = weighted_literals(index, &vars);
    let max_cost: usize = weighted.iter().map(|(_, w)| *w).sum();

    for bound in 0..=max_cost {
        if cancel.is_cancelled() {
            return Err(PackspecError::cancelled("resolution was cancelled during SAT solving"));
        }
        if let Some(assignment) = solve_at_bound(&hard, &weighted, bound, &mut vars.manager)? {
            let mut out = HashMap::new();
            for (key, var) in &vars.vars {
                if *assignment.get(var).unwrap_or(&false) {
                    out.insert(key.0.clone(), key.1.clone());
                }
            }
            return Ok(out);
        }
    }

    Err(PackspecError::failed_precondition(
        "no satisfying assignment exists for the requested Debian dependencies",
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{AptVersionRecord, RepoIndexDocument};

    fn index_with(packages: Vec<(&str, Vec<AptVersionRecord>)>) -> RepoIndex {
        let mut apt_packages = HashMap::new();
        for (name, records) in packages {
            apt_packages.insert(name.to_string(), records);
        }
        RepoIndex::from_document(RepoIndexDocument {
            apt_packages,
            ..Default::default()
        })
    }

    fn record(version: &str, depends: &[&str]) -> AptVersionRecord {
        AptVersionRecord {
            version: version.to_string(),
            depends: depends.iter().map(|s| s.to_string()).collect(),
            pre_depends: vec![],
            provides: vec![],
        }
    }

    #[test]
    fn requesting_missing_package_fails_precondition() {
        let index = index_with(vec![("libfoo", vec![record("1.0", &[])])]);
        let vars = VarTable::build(&index);
        let cache = VersionCache::new();
        let err = user_dependency_clause(&index, &vars, &cache, "libbar", &[]).unwrap_err();
        assert!(matches!(err, PackspecError::FailedPrecondition(_)));
    }

    #[test]
    fn empty_index_fails_precondition() {
        let index = RepoIndex::default();
        let cache = VersionCache::new();
        let token = CancellationToken::new();
        let err = solve(&[], &index, &cache, &token).unwrap_err();
        assert!(matches!(err, PackspecError::FailedPrecondition(_)));
    }
}
