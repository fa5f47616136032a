//! packspec-core is the resolution and packaging engine that turns a
//! composed product specification, plus per-package manifests discovered in
//! a source workspace, into a reproducible, versioned set of installable OS
//! package locks.
//!
//! It blends two ecosystems — Debian (`apt`) and Python (`pip`) — and
//! produces bit-identical output given identical input. The crate performs
//! no I/O of its own: callers supply already-materialized specs, schema
//! files, manifests, and a repository-index snapshot; this crate only
//! composes, collects, resolves, and formats.

#![deny(missing_docs)]

pub mod collect;
pub mod compose;
pub mod constraint;
pub mod error;
pub mod index;
pub mod model;
pub mod policy;
pub mod project;
pub mod resolve;
pub mod satsolve;
pub mod schema;
pub mod version;

pub use error::{PackspecError, Result};
pub use model::{
    BundleRecord, Constraint, Dependency, DependencyKey, Directive, DirectiveAction, Ecosystem,
    LockRecord, Op, PackagingGroup, PackagingMode, Pattern, ResolutionRecord,
};
pub use resolve::{resolve, DebianMode, ResolveOptions, ResolveOutput};
