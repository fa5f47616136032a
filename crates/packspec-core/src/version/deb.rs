//! The Debian version space: `epoch:upstream-revision`, compared per Debian
//! policy's lexicographic-with-digit-runs algorithm.
//!
//! Parsing and comparison are delegated to the `debversion` crate, which
//! already implements the policy algorithm; this module only adapts it to
//! the engine's `(op, candidate, constraint)` predicate shape.

use super::ParsedVersion;
use crate::error::PackspecError;
use crate::model::Op;
use std::str::FromStr;

pub(super) fn parse(text: &str) -> Result<ParsedVersion, PackspecError> {
    debversion::Version::from_str(text)
        .map(ParsedVersion::Deb)
        .map_err(|e| PackspecError::invalid_argument(format!("invalid deb version '{text}': {e}")))
}

pub(super) fn satisfies(op: Op, candidate: &ParsedVersion, constraint: Option<&str>) -> bool {
    let ParsedVersion::Deb(candidate) = candidate else {
        return false;
    };
    if op == Op::None {
        return true;
    }
    let Some(constraint) = constraint else {
        return false;
    };
    let Ok(constraint) = debversion::Version::from_str(constraint) else {
        return false;
    };
    satisfies_values(op, candidate, &constraint)
}

/// Same predicate as [`satisfies`], but for a constraint that is already
/// parsed — the path a [`super::cache::VersionCache`] hit takes.
pub(super) fn satisfies_parsed(op: Op, candidate: &ParsedVersion, constraint: &ParsedVersion) -> bool {
    let (ParsedVersion::Deb(candidate), ParsedVersion::Deb(constraint)) = (candidate, constraint)
    else {
        return false;
    };
    if op == Op::None {
        return true;
    }
    satisfies_values(op, candidate, constraint)
}

fn satisfies_values(op: Op, candidate: &debversion::Version, constraint: &debversion::Version) -> bool {
    match op {
        Op::Eq => candidate == constraint,
        Op::Ne => candidate != constraint,
        Op::Ge => candidate >= constraint,
        Op::Le => candidate <= constraint,
        Op::Gt => candidate > constraint,
        Op::Lt => candidate < constraint,
        // `~=` is meaningless on Debian versions; never satisfied.
        Op::Compatible => false,
        Op::None => true,
    }
}
