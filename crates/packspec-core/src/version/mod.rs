//! Version parsing and comparison for the two supported version spaces.
//!
//! Ecosystem-specific behavior is modeled as the small capability set
//! described in the design notes: `parse`, `compare`, `satisfies`. A
//! discriminated match on [`crate::model::Ecosystem`] picks the
//! implementation; no trait object or runtime type discovery is needed.

pub mod cache;
mod deb;
mod pep440;

use crate::error::PackspecError;
use crate::model::{Ecosystem, Op};
use cache::VersionCache;
use std::cmp::Ordering;

/// A successfully parsed version, tagged with the space it was parsed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedVersion {
    /// A Debian `epoch:upstream-revision` version.
    Deb(debversion::Version),
    /// A PEP 440 version.
    Pep(pep440_rs::Version),
}

impl Ecosystem {
    /// Parses `text` in this ecosystem's version space.
    pub fn parse_version(&self, text: &str) -> Result<ParsedVersion, PackspecError> {
        match self {
            Ecosystem::Apt => deb::parse(text),
            Ecosystem::Pip => pep440::parse(text),
        }
    }

    /// Compares two versions already known to be in this ecosystem's space.
    /// Versions that fail to parse fall back to lexicographic order —
    /// stable, but never used for a correctness decision.
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        match (self.parse_version(a), self.parse_version(b)) {
            (Ok(a), Ok(b)) => compare_parsed(&a, &b),
            _ => a.cmp(b),
        }
    }

    /// Evaluates `satisfies(op, candidate, constraint)` for this ecosystem.
    /// A malformed `candidate` or `constraint` makes the predicate `false`.
    pub fn satisfies(&self, op: Op, candidate: &str, constraint: Option<&str>) -> bool {
        let candidate = match self.parse_version(candidate) {
            Ok(v) => v,
            Err(_) => return false,
        };
        match self {
            Ecosystem::Apt => deb::satisfies(op, &candidate, constraint),
            Ecosystem::Pip => pep440::satisfies(op, &candidate, constraint),
        }
    }

    /// Same predicate as [`satisfies`](Self::satisfies), but parses both
    /// sides through `cache` instead of fresh every call — the candidate
    /// side in particular is tested against many constraints in a row
    /// during resolution, so this turns O(constraints) reparses of the same
    /// string into one.
    pub fn satisfies_cached(
        &self,
        cache: &VersionCache,
        op: Op,
        candidate: &str,
        constraint: Option<&str>,
    ) -> bool {
        let Some(candidate) = cache.get_or_parse(*self, candidate) else {
            return false;
        };
        match self {
            Ecosystem::Apt => match constraint.and_then(|c| cache.get_or_parse(*self, c)) {
                Some(constraint) => deb::satisfies_parsed(op, &candidate, &constraint),
                None if op == Op::None => true,
                None => false,
            },
            // PEP 440 range/compatible-release operators build their
            // `VersionSpecifier` from the raw constraint string (its
            // semantics aren't reproducible from a bare value comparison),
            // so there's no parsed form of the constraint side to cache.
            Ecosystem::Pip => pep440::satisfies(op, &candidate, constraint),
        }
    }

    /// Cached counterpart of [`compare`](Self::compare).
    pub fn compare_cached(&self, cache: &VersionCache, a: &str, b: &str) -> Ordering {
        match (cache.get_or_parse(*self, a), cache.get_or_parse(*self, b)) {
            (Some(pa), Some(pb)) => compare_parsed(&pa, &pb),
            _ => a.cmp(b),
        }
    }
}

fn compare_parsed(a: &ParsedVersion, b: &ParsedVersion) -> Ordering {
    match (a, b) {
        (ParsedVersion::Deb(a), ParsedVersion::Deb(b)) => a.cmp(b),
        (ParsedVersion::Pep(a), ParsedVersion::Pep(b)) => {
            a.partial_cmp(b).unwrap_or(Ordering::Equal)
        }
        // Mixing spaces never happens in practice (dispatch is always keyed
        // by ecosystem); fall back to a stable, arbitrary order.
        (ParsedVersion::Deb(_), ParsedVersion::Pep(_)) => Ordering::Less,
        (ParsedVersion::Pep(_), ParsedVersion::Deb(_)) => Ordering::Greater,
    }
}

/// Selects the greatest element of `available` that satisfies every one of
/// `dep`'s constraints.
///
/// Fails with [`PackspecError::NotFound`] when `available` is empty, and
/// with [`PackspecError::FailedPrecondition`] when every candidate fails at
/// least one constraint.
pub fn best_compatible<'a>(
    ecosystem: Ecosystem,
    cache: &VersionCache,
    constraints: &[(Op, Option<&str>)],
    available: &'a [String],
) -> Result<&'a str, PackspecError> {
    if available.is_empty() {
        return Err(PackspecError::not_found(
            "no available versions to select from",
        ));
    }
    let mut best: Option<&'a str> = None;
    for candidate in available {
        let ok = constraints
            .iter()
            .all(|(op, ver)| ecosystem.satisfies_cached(cache, *op, candidate, *ver));
        if !ok {
            continue;
        }
        best = match best {
            None => Some(candidate.as_str()),
            Some(current) => {
                if ecosystem.compare_cached(cache, candidate, current) == Ordering::Greater {
                    Some(candidate.as_str())
                } else {
                    Some(current)
                }
            }
        };
    }
    best.ok_or_else(|| {
        PackspecError::failed_precondition("no candidate version satisfies all constraints")
    })
}
