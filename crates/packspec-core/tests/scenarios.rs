//! End-to-end tests for the seed scenarios and universal invariants.
//!
//! Each `S<n>` test below corresponds to a concrete scenario; the remaining
//! tests exercise invariants that aren't pinned to one specific scenario.

use tokio_util::sync::CancellationToken;

use packspec_core::model::{Directive, DirectiveAction, DependencyKey, Ecosystem, Op};
use packspec_core::resolve::{resolve, DebianMode, ResolveOptions};
use test_utils::{apt_packages_index, apt_record, catch_all_group, dep, flat_index};

fn no_cancel() -> CancellationToken {
    CancellationToken::new()
}

/// S1 — Priority override: `product` wins over `profile` and `package_xml`.
#[test]
fn s1_priority_override() {
    let index = flat_index(&[], &[("libfoo", &["1.0.0", "1.2.0"])]);
    let deps = vec![
        dep(Ecosystem::Apt, "libfoo", Op::Eq, Some("1.2.0"), "product:manual"),
        dep(Ecosystem::Apt, "libfoo", Op::Eq, Some("1.0.0"), "profile:base:manual"),
        dep(Ecosystem::Apt, "libfoo", Op::Ge, Some("0.5.0"), "package_xml:export"),
    ];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();
    assert_eq!(out.locks.len(), 1);
    assert_eq!(out.locks[0].package_name, "libfoo");
    assert_eq!(out.locks[0].version, "1.2.0");
    assert!(out.report.is_empty());
}

/// S2 — Fallback through an unconstrained product-layer request: the
/// product's bare name must not mask the profile's constrained one.
#[test]
fn s2_fallback_through_unconstrained_product_layer() {
    let index = flat_index(&[], &[("libfoo", &["1.0.0", "2.0.0"])]);
    let deps = vec![
        dep(Ecosystem::Apt, "libfoo", Op::None, None, "product:manual"),
        dep(Ecosystem::Apt, "libfoo", Op::Le, Some("1.0.0"), "profile:base:manual"),
    ];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();
    assert_eq!(out.locks[0].version, "1.0.0");
}

/// S3 — A conflicting constraint set is rescued by a `force` directive.
#[test]
fn s3_conflict_resolved_by_force() {
    let index = flat_index(&[], &[("libfoo", &["1.0.0", "1.2.0"])]);
    let deps = vec![
        dep(Ecosystem::Apt, "libfoo", Op::Ge, Some("2.0.0"), "product:manual"),
        dep(Ecosystem::Apt, "libfoo", Op::Lt, Some("2.0.0"), "product:manual"),
    ];
    let directives = vec![Directive {
        dependency: DependencyKey::new(Ecosystem::Apt, "libfoo"),
        action: DirectiveAction::Force,
        value: Some("1.2.0".to_string()),
        reason: "known-good pin".into(),
        owner: "team".into(),
        expires_at: None,
    }];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &directives,
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();
    assert_eq!(out.locks[0].version, "1.2.0");
    assert_eq!(out.report.len(), 1);
    assert_eq!(out.report[0].action, DirectiveAction::Force);
}

/// S4 — Python name normalization: `Requests` locks as `python3-requests`.
#[test]
fn s4_python_name_normalization() {
    let index = flat_index(&[("requests", &["2.0.0"])], &[]);
    let deps = vec![dep(Ecosystem::Pip, "Requests", Op::Eq, Some("2.0.0"), "product:manual")];
    let directives = vec![Directive {
        dependency: DependencyKey::new(Ecosystem::Pip, "Requests"),
        action: DirectiveAction::Force,
        value: Some("2.0.0".to_string()),
        reason: "pin".into(),
        owner: "team".into(),
        expires_at: None,
    }];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &directives,
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();
    assert_eq!(out.locks[0].package_name, "python3-requests");
    assert_eq!(out.locks[0].version, "2.0.0");
}

/// S5 — A Debian alternative satisfied through `provides`: both the
/// dependent and the provider end up in the lock.
#[test]
fn s5_debian_alternative_via_provides() {
    let index = apt_packages_index(vec![
        ("app", vec![apt_record("1.0.0", &["mail-transport-agent"], &[])]),
        ("postfix", vec![apt_record("3.5.0", &[], &["mail-transport-agent"])]),
    ]);
    let deps = vec![dep(Ecosystem::Apt, "app", Op::None, None, "product:manual")];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::Sat },
        &no_cancel(),
    )
    .unwrap();
    let names: Vec<&str> = out.locks.iter().map(|l| l.package_name.as_str()).collect();
    assert!(names.contains(&"app"));
    assert!(names.contains(&"postfix"));
}

/// S6 — The SAT solver picks the newest version consistent with the
/// constraint set, not merely *a* satisfying one.
#[test]
fn s6_sat_picks_newest_consistent_version() {
    let index = apt_packages_index(vec![(
        "libfoo",
        vec![apt_record("1.0.0", &[], &[]), apt_record("2.0.0", &[], &[]), apt_record("3.0.0", &[], &[])],
    )]);
    let deps = vec![dep(Ecosystem::Apt, "libfoo", Op::Le, Some("2.0.0"), "product:manual")];
    let groups = vec![catch_all_group("robot")];
    let out = resolve(
        deps,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::Sat },
        &no_cancel(),
    )
    .unwrap();
    assert_eq!(out.locks.len(), 1);
    assert_eq!(out.locks[0].version, "2.0.0");
}

/// Invariant: replacing a constraint with a same-source, strictly weaker one
/// (a looser upper bound) never causes the previously-selected version to
/// become *older*.
#[test]
fn priority_monotonicity_weaker_constraint_never_regresses_version() {
    let index = flat_index(&[], &[("libfoo", &["1.0.0", "2.0.0", "3.0.0"])]);
    let groups = vec![catch_all_group("robot")];

    let tight = vec![dep(Ecosystem::Apt, "libfoo", Op::Le, Some("2.0.0"), "product:manual")];
    let loose = vec![dep(Ecosystem::Apt, "libfoo", Op::Le, Some("3.0.0"), "product:manual")];

    let tight_out = resolve(
        tight,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();
    let loose_out = resolve(
        loose,
        &[],
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap();

    let parse = |v: &str| v.parse::<u32>().unwrap_or(0);
    assert!(parse(&loose_out.locks[0].version) >= parse(&tight_out.locks[0].version));
}

/// Invariant: lock output is stable across repeated runs over identical
/// input — no map-iteration-order leakage.
#[test]
fn lock_order_is_stable_across_repeated_runs() {
    let index = flat_index(
        &[("zeta", &["1.0.0"]), ("alpha", &["1.0.0"]), ("mu", &["1.0.0"])],
        &[],
    );
    let deps = vec![
        dep(Ecosystem::Pip, "zeta", Op::None, None, "product:manual"),
        dep(Ecosystem::Pip, "alpha", Op::None, None, "product:manual"),
        dep(Ecosystem::Pip, "mu", Op::None, None, "product:manual"),
    ];
    let groups = vec![catch_all_group("robot")];
    let opts = ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage };

    let first = resolve(deps.clone(), &[], &groups, &index, opts, &no_cancel()).unwrap();
    let second = resolve(deps, &[], &groups, &index, opts, &no_cancel()).unwrap();
    assert_eq!(first.locks, second.locks);
    let names: Vec<&str> = first.locks.iter().map(|l| l.package_name.as_str()).collect();
    assert_eq!(names, vec!["python3-alpha", "python3-mu", "python3-zeta"]);
}

/// Invariant: a `block` directive fails resolution with `PermissionDenied`,
/// and never produces a lock record for that dependency. `block` is only
/// consulted once a dependency is otherwise unsatisfiable (`spec.md` §4.6
/// step 5), so the request below is deliberately impossible to satisfy.
#[test]
fn block_directive_denies_and_emits_nothing() {
    let index = flat_index(&[], &[("libfoo", &["1.0.0"])]);
    let deps = vec![dep(Ecosystem::Apt, "libfoo", Op::Ge, Some("5.0.0"), "product:manual")];
    let directives = vec![Directive {
        dependency: DependencyKey::new(Ecosystem::Apt, "libfoo"),
        action: DirectiveAction::Block,
        value: None,
        reason: "security hold".into(),
        owner: "security".into(),
        expires_at: None,
    }];
    let groups = vec![catch_all_group("robot")];
    let err = resolve(
        deps,
        &directives,
        &groups,
        &index,
        ResolveOptions { target: "robot", debian_mode: DebianMode::SinglePackage },
        &no_cancel(),
    )
    .unwrap_err();
    assert!(matches!(err, packspec_core::PackspecError::PermissionDenied(_)));
}
