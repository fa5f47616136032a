//! Parsing of per-package `package.xml` manifests: the `<name>` element,
//! typed export tags inside `<export>`, and the abstract scoped dependency
//! tags (`depend`, `build_depend`, `exec_depend`, `build_export_depend`,
//! `run_depend`, `test_depend`).

use std::io::BufRead;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

use crate::error::PackspecError;
use crate::model::Ecosystem;

/// The scope an abstract dependency tag was declared under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// `<depend>` — needed in every configuration.
    All,
    /// `<exec_depend>` or the legacy `<run_depend>`.
    Exec,
    /// `<build_depend>`.
    Build,
    /// `<build_export_depend>` — needed to build *against* this package.
    BuildExec,
    /// `<test_depend>`.
    Test,
}

/// One typed export entry: an explicit, ecosystem-tagged dependency
/// declared under `<export>` rather than through the abstract schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypedExport {
    /// Which ecosystem this entry targets.
    pub ecosystem: Ecosystem,
    /// The concrete package name.
    pub name: String,
    /// An optional constraint string (`version` attribute).
    pub version: Option<String>,
}

/// One abstract dependency tag: an opaque key to be resolved through the
/// schema-mapping table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AbstractTag {
    /// The abstract key, e.g. `ros_base`.
    pub key: String,
    /// The scope it was declared under.
    pub scope: Scope,
}

/// A parsed `package.xml` manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// The package's own name, from the top-level `<name>` element.
    pub name: String,
    /// Typed export entries, from `<export>/<depend_apt|depend_pip>`.
    pub typed: Vec<TypedExport>,
    /// Abstract dependency tags, from the five scoped element names.
    pub abstract_tags: Vec<AbstractTag>,
}

fn scope_for_tag(tag: &str) -> Option<Scope> {
    match tag {
        "depend" => Some(Scope::All),
        "build_depend" => Some(Scope::Build),
        "exec_depend" | "run_depend" => Some(Scope::Exec),
        "build_export_depend" => Some(Scope::BuildExec),
        "test_depend" => Some(Scope::Test),
        _ => None,
    }
}

fn typed_ecosystem_for_tag(tag: &str) -> Option<Ecosystem> {
    match tag {
        "depend_apt" => Some(Ecosystem::Apt),
        "depend_pip" => Some(Ecosystem::Pip),
        _ => None,
    }
}

/// Parses a `package.xml` document from `reader`.
pub fn parse_manifest<R: BufRead>(reader: R) -> Result<Manifest, PackspecError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(true);

    let mut manifest = Manifest::default();
    let mut buf = Vec::new();
    let mut in_export = false;
    // (tag name, pending version attribute) of the element we're currently
    // reading text content for.
    let mut pending: Option<(String, Option<String>)> = None;

    loop {
        match xml.read_event_into(&mut buf).map_err(|e| {
            PackspecError::invalid_argument(format!("malformed package.xml: {e}"))
        })? {
            Event::Start(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                if name == "export" {
                    in_export = true;
                    continue;
                }
                let version = tag
                    .attributes()
                    .flatten()
                    .find(|a| a.key.as_ref() == b"version")
                    .and_then(|a| a.unescape_value().ok().map(|v| v.into_owned()));
                pending = Some((name, version));
            }
            Event::Text(text) => {
                if let Some((tag, version)) = pending.take() {
                    let value = text.unescape().unwrap_or_default().trim().to_string();
                    if tag == "name" {
                        manifest.name = value;
                    } else if in_export {
                        if let Some(ecosystem) = typed_ecosystem_for_tag(&tag) {
                            manifest.typed.push(TypedExport {
                                ecosystem,
                                name: value,
                                version,
                            });
                        }
                    } else if let Some(scope) = scope_for_tag(&tag) {
                        manifest.abstract_tags.push(AbstractTag { key: value, scope });
                    }
                }
            }
            Event::End(tag) => {
                let name = String::from_utf8_lossy(tag.name().as_ref()).into_owned();
                if name == "export" {
                    in_export = false;
                }
                pending = None;
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(manifest)
}
