// src/watch/filter.rs

use globset::{Glob, GlobSet, GlobSetBuilder};

use crate::errors::Result;

/// Compiled include filter applied to bare file names.
///
/// Semantics:
/// - Hidden files (leading `.`) are always rejected.
/// - An empty pattern list accepts everything else.
/// - Otherwise any glob match wins.
#[derive(Debug, Clone)]
pub struct FileFilter {
    /// `None` when no patterns were configured (accept-all).
    set: Option<GlobSet>,
}

impl FileFilter {
    /// Compile the configured patterns. Invalid globs are configuration
    /// errors and surface at startup.
    pub fn new(patterns: &[String]) -> Result<Self> {
        if patterns.is_empty() {
            return Ok(Self { set: None });
        }
        Ok(Self {
            set: Some(build_globset(patterns)?),
        })
    }

    /// Does this bare file name pass the filter?
    pub fn matches(&self, name: &str) -> bool {
        if name.starts_with('.') {
            return false;
        }
        match &self.set {
            None => true,
            Some(set) => set.is_match(name),
        }
    }
}

/// Build a GlobSet from simple string patterns.
fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pat in patterns {
        builder.add(Glob::new(pat)?);
    }
    Ok(builder.build()?)
}
