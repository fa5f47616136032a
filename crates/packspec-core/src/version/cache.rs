//! A parsed-version cache keyed on the textual form, scoped to a single
//! resolution call. Avoids repeat parsing in the inner loops of the SAT
//! solver and the best-version search. No process-wide state survives a
//! `resolve()` call — a fresh cache is created per resolution.

use std::cell::RefCell;
use std::collections::HashMap;

use super::ParsedVersion;
use crate::model::Ecosystem;

/// A per-resolution cache of parsed versions, keyed by `(ecosystem, text)`.
#[derive(Default)]
pub struct VersionCache {
    inner: RefCell<HashMap<(Ecosystem, Box<str>), ParsedVersion>>,
}

impl VersionCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached parse of `text` in `ecosystem`'s space, parsing
    /// and inserting it on first use. Unparseable text is not cached; the
    /// caller's own fallback handling applies.
    pub fn get_or_parse(&self, ecosystem: Ecosystem, text: &str) -> Option<ParsedVersion> {
        if let Some(v) = self.inner.borrow().get(&(ecosystem, text.into())) {
            return Some(v.clone());
        }
        let parsed = ecosystem.parse_version(text).ok()?;
        self.inner
            .borrow_mut()
            .insert((ecosystem, text.into()), parsed.clone());
        Some(parsed)
    }
}
