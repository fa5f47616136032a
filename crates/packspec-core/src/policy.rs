//! The packaging policy: pattern-matches `(ecosystem, name)` to a
//! packaging-group verdict and applies that group's version pins.

use tracing::instrument;

use crate::constraint::parse_constraint;
use crate::error::PackspecError;
use crate::model::{Constraint, Ecosystem, PackagingGroup};

/// Finds the packaging group that governs `(ecosystem, name)` for
/// `target`, among `groups`.
///
/// Only groups whose `targets` include `target` are considered. Among those,
/// the match wins by **exact > prefix > wildcard** specificity; ties at
/// equal specificity are broken by earlier group-index. Fails with
/// [`PackspecError::NotFound`] if no group matches.
#[instrument(skip(groups), fields(ecosystem = %ecosystem, name, target))]
pub fn classify<'g>(
    ecosystem: Ecosystem,
    name: &str,
    target: &str,
    groups: &'g [PackagingGroup],
) -> Result<&'g PackagingGroup, PackspecError> {
    let mut best: Option<(u8, usize, &PackagingGroup)> = None;
    for (index, group) in groups.iter().enumerate() {
        if !group.targets.iter().any(|t| t == target) {
            continue;
        }
        let Some(specificity) = group
            .matches
            .iter()
            .filter(|pattern| pattern.matches(ecosystem, name))
            .map(|pattern| pattern.specificity())
            .max()
        else {
            continue;
        };
        let better = match best {
            None => true,
            Some((best_specificity, best_index, _)) => {
                specificity > best_specificity || (specificity == best_specificity && index < best_index)
            }
        };
        if better {
            best = Some((specificity, index, group));
        }
    }
    best.map(|(_, _, group)| group).ok_or_else(|| {
        PackspecError::not_found(format!(
            "no packaging group matches {ecosystem}:{name} for target '{target}'"
        ))
    })
}

/// Appends every pin in `group` whose name equals `name` to `constraints`,
/// tagged with `source = "packaging:pin"`.
pub fn apply_pins(
    group: &PackagingGroup,
    name: &str,
    constraints: &mut Vec<Constraint>,
) -> Result<(), PackspecError> {
    for pin in &group.pins {
        let constraint = parse_constraint(pin, "packaging:pin")?;
        if constraint.name == name {
            constraints.push(constraint);
        }
    }
    Ok(())
}
