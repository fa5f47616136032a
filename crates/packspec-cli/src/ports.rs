//! The out-of-scope "external collaborator" ports named by the engine's
//! purpose statement: deb building, artifact fetching/publishing, and
//! remote profile retrieval. None of these are implemented here — the
//! engine never performs this I/O, and this crate only demonstrates the
//! ports the filesystem-backed adapters *do* cover (see
//! [`crate::fs_adapters`]). These traits exist so a real deployment has a
//! documented seam to plug into; wiring a concrete implementation is future
//! work, not something this CLI does.

use packspec_core::compose::Spec;
use packspec_core::Result;

/// Resolves a `(name, version)` profile reference to its spec content.
/// A real implementation would fetch from a profile registry or VCS; this
/// CLI only ever reads profiles the caller already has on disk, so no
/// implementation of this trait ships here.
pub trait ProfileSource {
    /// Fetches the named profile's spec.
    fn fetch(&self, name: &str, version: &str) -> Result<Spec>;
}

/// Builds an installable package artifact from a resolved lock entry. Deb
/// building is an explicit non-goal of the resolution engine itself.
pub trait BuildBackend {
    /// Builds the named, versioned package, returning an opaque path or
    /// identifier for the produced artifact.
    fn build(&self, package_name: &str, version: &str) -> Result<String>;
}

/// Uploads built artifacts to a package repository/channel. Snapshot
/// persistence and upload are explicit non-goals of the resolution engine.
pub trait ArtifactPublisher {
    /// Publishes `artifact` to `repository`/`channel`.
    fn publish(&self, artifact: &str, repository: &str, channel: &str) -> Result<()>;
}
