//! The PEP 440 version space: release segments, pre/post/dev tags, local
//! identifiers, and specifier sets — delegated entirely to `pep440_rs`,
//! which the teacher crate already depends on for the same purpose.

use super::ParsedVersion;
use crate::error::PackspecError;
use crate::model::Op;
use pep440_rs::{Version, VersionSpecifier};
use std::str::FromStr;

pub(super) fn parse(text: &str) -> Result<ParsedVersion, PackspecError> {
    Version::from_str(text)
        .map(ParsedVersion::Pep)
        .map_err(|e| {
            PackspecError::invalid_argument(format!("invalid pep440 version '{text}': {e}"))
        })
}

pub(super) fn satisfies(op: Op, candidate: &ParsedVersion, constraint: Option<&str>) -> bool {
    let ParsedVersion::Pep(candidate) = candidate else {
        return false;
    };
    if op == Op::None {
        return true;
    }
    let Some(constraint) = constraint else {
        return false;
    };
    // `!=` is handled the same way on both version spaces: reject the exact
    // forbidden version, accept everything else.
    if op == Op::Ne {
        return match Version::from_str(constraint) {
            Ok(c) => *candidate != c,
            Err(_) => false,
        };
    }
    let spec_str = format!("{op}{constraint}");
    match VersionSpecifier::from_str(&spec_str) {
        Ok(spec) => spec.contains(candidate),
        Err(_) => false,
    }
}
