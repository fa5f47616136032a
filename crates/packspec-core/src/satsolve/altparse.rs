//! Parsing of Debian dependency relation groups (`depends`/`pre_depends`
//! raw strings) into their `|`-separated alternative specs.
//!
//! Grounded in the hand-written relation parser of
//! `other_examples/111ba094_RyanGibb-pubgrub-debian__src-parse.rs.rs`
//! (its `Alternative`/`VersionConstraint` shapes), rewritten against this
//! crate's own [`Op`] rather than importing that crate's types, and using
//! `peg` the way [`crate::constraint`] already does for the simpler
//! constraint-string grammar.

use crate::error::PackspecError;
use crate::model::Op;

peg::parser! {
    grammar grammar() for str {
        rule _() = quiet!{[' ' | '\t']*}

        rule name_char() -> char
            = c:[^ ' ' | '\t' | '(' | ':' | '[' | '|']  { c }

        rule name() -> &'input str
            = $(name_char()+)

        rule arch_qualifier()
            = ":" name_char()+

        // Tried longest-first so `<<`/`>>` are not swallowed by a future
        // single-character rule; unrecognized operators simply don't match
        // here, which routes the whole "(...)" group to `any_paren` below.
        rule known_op() -> Op
            = "<<" { Op::Lt }
            / ">>" { Op::Gt }
            / ">=" { Op::Ge }
            / "<=" { Op::Le }
            / "=" { Op::Eq }

        rule version_text() -> &'input str
            = $([^ ')']+)

        rule version_constraint() -> (Op, String)
            = "(" _ o:known_op() _ v:version_text() _ ")" { (o, v.trim().to_string()) }

        rule any_paren()
            = "(" [^ ')']* ")"

        rule build_profile()
            = "[" [^ ']']* "]"

        pub rule alternative() -> (String, Op, Option<String>)
            = _ n:name() arch_qualifier()? _ vc:version_constraint() _ build_profile()? _ {
                (n.to_string(), vc.0, Some(vc.1))
            }
            / _ n:name() arch_qualifier()? _ any_paren() _ build_profile()? _ {
                (n.to_string(), Op::None, None)
            }
            / _ n:name() arch_qualifier()? _ build_profile()? _ {
                (n.to_string(), Op::None, None)
            }
    }
}

/// One parsed alternative out of a `|`-separated relation group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alternative {
    /// The (arch/profile-stripped) package name.
    pub name: String,
    /// The version operator; [`Op::None`] when absent or unrecognized.
    pub op: Op,
    /// The version operand, present iff `op` is not [`Op::None`].
    pub version: Option<String>,
}

/// Parses a raw `depends`/`pre_depends` relation group (one comma-separated
/// element, already split by the caller) into its `|`-separated
/// alternatives.
///
/// Architecture qualifiers (`name:arch`) and build profiles (`[profile]`)
/// are stripped. An operator outside `{>=, <=, =, <<, >>}` degrades the
/// alternative to a bare-name (no-version) constraint rather than failing.
pub fn parse_alternatives(group: &str) -> Result<Vec<Alternative>, PackspecError> {
    group
        .split('|')
        .map(|part| {
            let (name, op, version) = grammar::alternative(part.trim()).map_err(|e| {
                PackspecError::invalid_argument(format!(
                    "malformed dependency relation '{group}': {e}"
                ))
            })?;
            Ok(Alternative { name, op, version })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_name() {
        let alts = parse_alternatives("libfoo").unwrap();
        assert_eq!(alts, vec![Alternative { name: "libfoo".into(), op: Op::None, version: None }]);
    }

    #[test]
    fn parses_version_constraint_and_maps_shift_operators() {
        let alts = parse_alternatives("libfoo (>= 1.0)").unwrap();
        assert_eq!(alts[0].op, Op::Ge);
        assert_eq!(alts[0].version.as_deref(), Some("1.0"));

        let alts = parse_alternatives("libfoo (<< 2.0)").unwrap();
        assert_eq!(alts[0].op, Op::Lt);
        let alts = parse_alternatives("libfoo (>> 2.0)").unwrap();
        assert_eq!(alts[0].op, Op::Gt);
    }

    #[test]
    fn strips_arch_qualifier_and_build_profile() {
        let alts = parse_alternatives("libfoo:amd64 [amd64 arm64]").unwrap();
        assert_eq!(alts[0].name, "libfoo");
        assert_eq!(alts[0].op, Op::None);
    }

    #[test]
    fn unknown_operator_degrades_to_no_version_constraint() {
        let alts = parse_alternatives("libfoo (~= 1.0)").unwrap();
        assert_eq!(alts[0].name, "libfoo");
        assert_eq!(alts[0].op, Op::None);
        assert_eq!(alts[0].version, None);
    }

    #[test]
    fn splits_pipe_separated_alternatives() {
        let alts = parse_alternatives("libfoo | libbar (>= 2.0)").unwrap();
        assert_eq!(alts.len(), 2);
        assert_eq!(alts[1].name, "libbar");
        assert_eq!(alts[1].op, Op::Ge);
    }
}
