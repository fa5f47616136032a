//! Output projection: turns a [`crate::resolve::ResolveOutput`] into the
//! four textual external artifacts named in `spec.md` §6. The engine never
//! writes these to disk itself — it only formats them; a caller (the CLI)
//! decides where the text goes.

use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::model::{BundleRecord, LockRecord, ResolutionRecord};
use crate::resolve::ResolveOutput;

/// Renders the lock-record stream: `name=version` per line, sorted by
/// package name (the order [`ResolveOutput::locks`] is already produced in).
pub fn render_lock_stream(locks: &[LockRecord]) -> String {
    let mut out = String::new();
    for lock in locks {
        let _ = writeln!(out, "{}={}", lock.package_name, lock.version);
    }
    out
}

/// Renders the bundle-manifest stream: `group,mode,package,version` per
/// line, sorted by `(group, package, version, mode)`.
pub fn render_bundle_stream(bundle: &[BundleRecord]) -> String {
    let mut out = String::new();
    for record in bundle {
        let _ = writeln!(
            out,
            "{},{},{},{}",
            record.group, record.mode, record.package, record.version
        );
    }
    out
}

fn action_str(action: crate::model::DirectiveAction) -> &'static str {
    use crate::model::DirectiveAction::*;
    match action {
        Force => "force",
        Relax => "relax",
        Replace => "replace",
        Block => "block",
    }
}

/// Renders the resolution-report stream:
/// `dependency,action,value,reason,owner,expires_at` per line, sorted by
/// `(dependency, action, value, owner, reason)`.
///
/// `expires_at` is always rendered empty — the resolution record carries no
/// expiry (that lives on the originating [`crate::model::Directive`]); the
/// column exists for external-interface parity with `spec.md` §6's stream
/// shape.
pub fn render_report_stream(report: &[ResolutionRecord]) -> String {
    let mut out = String::new();
    for record in report {
        let _ = writeln!(
            out,
            "{},{},{},{},{},",
            record.dependency,
            action_str(record.action),
            record.value.as_deref().unwrap_or(""),
            record.reason,
            record.owner,
        );
    }
    out
}

/// The record that names a resolution run and pins it to a
/// repository/channel pair. The engine only knows how to format this — it
/// never persists it; persisting a snapshot pointer to a remote package
/// server is an explicit non-goal (`spec.md` §1).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotIntent {
    /// The destination repository name.
    pub repository: String,
    /// The destination channel name.
    pub channel: String,
    /// The prefix under which this snapshot's artifacts are published.
    pub snapshot_prefix: String,
    /// The unique id assigned to this snapshot.
    pub snapshot_id: String,
    /// An opaque creation timestamp, stamped by the caller.
    pub created_at: String,
    /// The signing key identifier, opaque to the engine (no signing is
    /// performed here — `spec.md` §1's non-goals).
    pub signing_key: String,
}

/// Renders a [`SnapshotIntent`] as `key: value` lines, one field per line,
/// in the field order given in `spec.md` §6.
pub fn render_snapshot_intent(intent: &SnapshotIntent) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "repository: {}", intent.repository);
    let _ = writeln!(out, "channel: {}", intent.channel);
    let _ = writeln!(out, "snapshot_prefix: {}", intent.snapshot_prefix);
    let _ = writeln!(out, "snapshot_id: {}", intent.snapshot_id);
    let _ = writeln!(out, "created_at: {}", intent.created_at);
    let _ = writeln!(out, "signing_key: {}", intent.signing_key);
    out
}

/// Renders all three resolver output streams at once, for convenience.
pub fn render_all(output: &ResolveOutput) -> (String, String, String) {
    (
        render_lock_stream(&output.locks),
        render_bundle_stream(&output.bundle),
        render_report_stream(&output.report),
    )
}
