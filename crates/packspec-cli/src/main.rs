//! Thin binary front end: reads already-materialized product/profile specs,
//! schema-mapping files, a workspace tree, and a repository-index file from
//! disk, drives `packspec-core` end to end, and writes the three output
//! streams. No network access, no deb building, no artifact publishing —
//! see [`ports`] for the boundaries this binary deliberately leaves
//! unimplemented.

mod cli;
mod fs_adapters;
mod ports;

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::path::Path;
use std::str::FromStr;

use clap::Parser;
use miette::IntoDiagnostic;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use packspec_core::collect::{self, CollectOptions};
use packspec_core::compose::{self, Spec};
use packspec_core::project;
use packspec_core::resolve::{self, DebianMode, ResolveOptions};
use packspec_core::schema::SchemaFile;

use cli::CliArgs;
use fs_adapters::{FsIndexSource, FsWorkspaceScanner};

/// The `--json` output shape: all three resolver streams as one document.
#[derive(Serialize, Debug)]
struct Solution {
    locks: Vec<packspec_core::LockRecord>,
    bundle: Vec<packspec_core::BundleRecord>,
    report: Vec<packspec_core::ResolutionRecord>,
}

fn read_spec(path: &Path) -> miette::Result<Spec> {
    let file = File::open(path).into_diagnostic()?;
    serde_json::from_reader(BufReader::new(file)).into_diagnostic()
}

fn write_stream(contents: &str, destination: &Option<std::path::PathBuf>) -> miette::Result<()> {
    match destination {
        Some(path) => std::fs::write(path, contents).into_diagnostic(),
        None => io::stdout().write_all(contents.as_bytes()).into_diagnostic(),
    }
}

fn actual_main() -> miette::Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_env_filter(args.verbose)))
        .init();

    let product = read_spec(&args.product)?;
    let profiles = args
        .profiles
        .iter()
        .map(|p| read_spec(p))
        .collect::<miette::Result<Vec<_>>>()?;
    let composed = compose::compose(&product, &profiles).into_diagnostic()?;

    let schema_files = args
        .schema
        .iter()
        .map(|path| {
            let file = File::open(path).into_diagnostic()?;
            SchemaFile::from_json_reader(BufReader::new(file)).into_diagnostic()
        })
        .collect::<miette::Result<Vec<_>>>()?;
    let mut schema = packspec_core::schema::merge_layers(schema_files);
    // The spec's own inline `schema` block takes precedence over standalone
    // schema files: it's the most specific layer, authored alongside the
    // product that needs it.
    schema.extend(composed.schema.clone());

    let manifests = FsWorkspaceScanner.scan(&args.workspace).into_diagnostic()?;
    let collected = collect::collect(
        &composed,
        &manifests,
        &schema,
        CollectOptions {
            exclude_workspace_internal: args.exclude_workspace_internal,
        },
    )
    .into_diagnostic()?;
    for key in &collected.unresolved {
        tracing::warn!(key = %key, "abstract dependency tag has no schema mapping, skipping");
    }

    let index = FsIndexSource.load(&args.index).into_diagnostic()?;

    let debian_mode = if args.sat { DebianMode::Sat } else { DebianMode::SinglePackage };
    let cancel = CancellationToken::new();
    let output = resolve::resolve(
        collected.dependencies,
        &composed.directives,
        &composed.packaging_groups,
        &index,
        ResolveOptions { target: &args.target, debian_mode },
        &cancel,
    )
    .into_diagnostic()?;

    let (lock, bundle, report) = project::render_all(&output);

    if args.json {
        let solution = Solution {
            locks: output.locks,
            bundle: output.bundle,
            report: output.report,
        };
        write_stream(&serde_json::to_string_pretty(&solution).into_diagnostic()?, &None)?;
        return Ok(());
    }

    write_stream(&lock, &args.lock_out)?;
    write_stream(&bundle, &args.bundle_out)?;
    write_stream(&report, &args.report_out)?;

    Ok(())
}

fn main() {
    if let Err(e) = actual_main() {
        eprintln!("{e:?}");
        std::process::exit(1);
    }
}

/// Constructs a default [`EnvFilter`] used when `RUST_LOG` is unset.
fn default_env_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!("packspec={level}"))
        .add_directive(Directive::from_str(&format!("packspec_core={level}")).unwrap())
}
