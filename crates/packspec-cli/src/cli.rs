//! Command-line argument surface. Every field names an already-materialized
//! input file or directory — this binary never fetches anything itself,
//! mirroring the `ResolveArgs` shape in the teacher's `rip_bin::cli`.

use std::path::PathBuf;

use clap::Parser;

/// Resolve a composed product spec against a workspace and a repository
/// index, emitting lock, bundle, and resolution-report streams.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct CliArgs {
    /// Path to the product spec JSON file.
    #[arg(long)]
    pub product: PathBuf,

    /// Paths to profile spec JSON files, in precedence order.
    #[arg(long = "profile")]
    pub profiles: Vec<PathBuf>,

    /// Paths to schema-mapping JSON files, later files overriding earlier
    /// ones per key.
    #[arg(long = "schema")]
    pub schema: Vec<PathBuf>,

    /// Path to the repository-index JSON file.
    #[arg(long)]
    pub index: PathBuf,

    /// Root of the source workspace to scan for `package.xml` manifests.
    #[arg(long)]
    pub workspace: PathBuf,

    /// The target-environment tag packaging groups are matched against.
    #[arg(long)]
    pub target: String,

    /// Resolve Debian dependencies as one SAT batch instead of
    /// independently, one at a time.
    #[arg(long)]
    pub sat: bool,

    /// Drop typed/abstract dependencies that resolve to a package already
    /// present in the scanned workspace.
    #[arg(long)]
    pub exclude_workspace_internal: bool,

    /// Write the lock stream to this file instead of stdout.
    #[arg(long)]
    pub lock_out: Option<PathBuf>,

    /// Write the bundle-manifest stream to this file instead of stdout.
    #[arg(long)]
    pub bundle_out: Option<PathBuf>,

    /// Write the resolution-report stream to this file instead of stdout.
    #[arg(long)]
    pub report_out: Option<PathBuf>,

    /// Emit the three output streams as one JSON document instead of their
    /// plain-text forms.
    #[arg(long)]
    pub json: bool,

    /// Verbose (`debug`-level) logging.
    #[arg(short, long)]
    pub verbose: bool,
}
