//! Directive application: rewrites a dependency per an authored override.

use crate::error::PackspecError;
use crate::model::{Constraint, Dependency, Directive, DirectiveAction, Op};

/// Applies `directive` to `dependency`, returning the rewritten value.
///
/// - `force` replaces every constraint with a single `==value`.
/// - `relax` clears all constraints.
/// - `replace` rewrites the dependency's name to `value` and clears
///   constraints.
/// - `block` never rewrites; it always fails with
///   [`PackspecError::PermissionDenied`].
pub fn apply(dependency: &Dependency, directive: &Directive) -> Result<Dependency, PackspecError> {
    match directive.action {
        DirectiveAction::Force => {
            let value = directive.value.clone().ok_or_else(|| {
                PackspecError::invalid_argument(format!(
                    "force directive for '{}' has no value",
                    directive.dependency
                ))
            })?;
            let constraint = Constraint {
                name: dependency.name.clone(),
                op: Op::Eq,
                version: Some(value),
                source: "resolution:force".to_string(),
            };
            Ok(Dependency {
                name: dependency.name.clone(),
                ecosystem: dependency.ecosystem,
                constraints: vec![constraint],
            })
        }
        DirectiveAction::Relax => Ok(Dependency {
            name: dependency.name.clone(),
            ecosystem: dependency.ecosystem,
            constraints: vec![],
        }),
        DirectiveAction::Replace => {
            let value = directive.value.clone().ok_or_else(|| {
                PackspecError::invalid_argument(format!(
                    "replace directive for '{}' has no value",
                    directive.dependency
                ))
            })?;
            Ok(Dependency {
                name: value,
                ecosystem: dependency.ecosystem,
                constraints: vec![],
            })
        }
        DirectiveAction::Block => Err(PackspecError::permission_denied(format!(
            "'{}' is blocked by a resolution directive",
            directive.dependency
        ))),
    }
}
