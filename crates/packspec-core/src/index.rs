//! A read-only view of available versions and Debian dependency metadata,
//! materialized from an already-loaded repository-index document. This
//! crate never fetches one over the network — see the design notes on the
//! out-of-scope external collaborators.

use std::collections::HashMap;
use std::io::Read;

use serde::{Deserialize, Serialize};

use crate::error::PackspecError;
use crate::model::normalize_pip_name;

/// One Debian `(version, depends, pre_depends, provides)` record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AptVersionRecord {
    /// The version string.
    pub version: String,
    /// Raw `depends` relation strings, alternative-group syntax intact.
    #[serde(default)]
    pub depends: Vec<String>,
    /// Raw `pre_depends` relation strings.
    #[serde(default)]
    pub pre_depends: Vec<String>,
    /// Names this version provides (virtual packages).
    #[serde(default)]
    pub provides: Vec<String>,
}

/// The raw, on-disk shape of the repository-index file (§6).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RepoIndexDocument {
    /// `pip`: package name (PEP-503 normalized) to an ascending version list.
    #[serde(default)]
    pub pip: HashMap<String, Vec<String>>,
    /// `apt`: package name to an ascending plain version list. Derivable
    /// from `apt_packages`; ignored when `apt_packages` is present for that
    /// name.
    #[serde(default)]
    pub apt: HashMap<String, Vec<String>>,
    /// `apt_packages`: package name to full version records. Authoritative
    /// over `apt` when both are present.
    #[serde(default)]
    pub apt_packages: HashMap<String, Vec<AptVersionRecord>>,
}

/// The in-memory, read-only repository-index snapshot used throughout a
/// resolution. Immutable for the duration of a resolve call.
#[derive(Debug, Clone, Default)]
pub struct RepoIndex {
    pip: HashMap<String, Vec<String>>,
    apt_packages: HashMap<String, Vec<AptVersionRecord>>,
}

impl RepoIndex {
    /// Builds a snapshot from an already-parsed document, deriving the
    /// plain `apt` version list from `apt_packages` wherever the latter is
    /// present for a name.
    pub fn from_document(doc: RepoIndexDocument) -> Self {
        let mut apt_packages = doc.apt_packages;
        for (name, versions) in doc.apt {
            apt_packages.entry(name).or_insert_with(|| {
                versions
                    .into_iter()
                    .map(|version| AptVersionRecord {
                        version,
                        depends: vec![],
                        pre_depends: vec![],
                        provides: vec![],
                    })
                    .collect()
            });
        }
        Self {
            pip: doc.pip,
            apt_packages,
        }
    }

    /// Reads and parses a repository-index document from `reader`.
    pub fn from_json_reader<R: Read>(reader: R) -> Result<Self, PackspecError> {
        let doc: RepoIndexDocument = serde_json::from_reader(reader)
            .map_err(|e| PackspecError::invalid_argument(format!("malformed index file: {e}")))?;
        Ok(Self::from_document(doc))
    }

    /// Returns the ascending version list for a pip package, trying the
    /// exact name first and the PEP-503-normalized name on a miss.
    ///
    /// If both the exact and normalized spellings exist with differing
    /// version lists, this is ambiguous input: fails with
    /// [`PackspecError::InvalidArgument`] rather than silently picking one.
    pub fn pip_versions(&self, name: &str) -> Result<Vec<String>, PackspecError> {
        let normalized = normalize_pip_name(name);
        match (self.pip.get(name), self.pip.get(&normalized)) {
            (Some(exact), Some(norm)) if name != normalized && exact != norm => {
                Err(PackspecError::invalid_argument(format!(
                    "index contains both '{name}' and '{normalized}' with differing version lists"
                )))
            }
            (Some(exact), _) => Ok(exact.clone()),
            (None, Some(norm)) => Ok(norm.clone()),
            (None, None) => Err(PackspecError::not_found(format!(
                "no pip index entry for '{name}' or '{normalized}'"
            ))),
        }
    }

    /// Returns the ascending plain version list for a Debian package.
    pub fn apt_versions(&self, name: &str) -> Result<Vec<String>, PackspecError> {
        self.apt_packages
            .get(name)
            .map(|records| records.iter().map(|r| r.version.clone()).collect())
            .ok_or_else(|| PackspecError::not_found(format!("no apt index entry for '{name}'")))
    }

    /// Returns the full version records for a Debian package, required by
    /// the SAT solver.
    pub fn apt_records(&self, name: &str) -> Option<&[AptVersionRecord]> {
        self.apt_packages.get(name).map(Vec::as_slice)
    }

    /// Iterates every `(name, records)` pair in the Debian half of the
    /// index — used by the SAT solver to build the `provides` index.
    pub fn iter_apt(&self) -> impl Iterator<Item = (&str, &[AptVersionRecord])> {
        self.apt_packages
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// `true` iff the index carries no `apt_packages` metadata at all — the
    /// SAT solver cannot run against a snapshot like this.
    pub fn is_apt_packages_empty(&self) -> bool {
        self.apt_packages.is_empty()
    }
}
