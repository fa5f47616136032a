//! Parsing of textual constraint strings of the shape `name<op><version>` or
//! a bare `name`.
//!
//! Grounded in the `peg`-based grammar `rattler_installs_packages` already
//! uses for PEP 508 requirement strings (`reqparse.rs`); this grammar is
//! much smaller since the operator set and name grammar are ecosystem
//! agnostic at this layer.

use crate::error::PackspecError;
use crate::model::{Constraint, Op};

peg::parser! {
    grammar grammar() for str {
        rule _() = quiet!{[' ' | '\t']*}

        // Tried in this order so that `>=`/`<=` are not swallowed by the
        // shorter `>`/`<` rules, and `==` is tried before the single `=`.
        rule op() -> Op
            = ">=" { Op::Ge }
            / "<=" { Op::Le }
            / "~=" { Op::Compatible }
            / "!=" { Op::Ne }
            / "==" { Op::Eq }
            / "=" { Op::Eq }
            / ">" { Op::Gt }
            / "<" { Op::Lt }

        rule name_char() -> char
            = c:[^ ' ' | '\t' | '=' | '!' | '~' | '<' | '>']  { c }

        rule name() -> &'input str
            = $(name_char()+)

        rule version_char() -> char
            = c:[^ ' ' | '\t']  { c }

        rule version() -> &'input str
            = $(version_char()+)

        pub rule constraint() -> (String, Op, Option<String>)
            = _ n:name() _ o:op() _ v:version() _ {
                (n.to_string(), o, Some(v.to_string()))
            }
            / _ n:name() _ {
                (n.to_string(), Op::None, None)
            }
    }
}

/// Parses a single constraint string (`name<op><version>` or a bare
/// `name`) into a [`Constraint`] tagged with `source`.
///
/// Fails with [`PackspecError::InvalidArgument`] when the name is missing,
/// or an operator is present with no version following it.
pub fn parse_constraint(raw: &str, source: impl Into<String>) -> Result<Constraint, PackspecError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(PackspecError::invalid_argument(
            "constraint string is empty",
        ));
    }
    let (name, op, version) = grammar::constraint(trimmed).map_err(|e| {
        PackspecError::invalid_argument(format!("malformed constraint '{raw}': {e}"))
    })?;
    if name.is_empty() {
        return Err(PackspecError::invalid_argument(format!(
            "constraint '{raw}' has no name"
        )));
    }
    Ok(Constraint {
        name,
        op,
        version,
        source: source.into(),
    })
}
