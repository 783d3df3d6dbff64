//! Compiled-class set
//!
//! The classes one compilation round produced, keyed by dotted class name.

use crate::class_name::ClassName;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};

/// Map of fully-qualified class name → freshly compiled class file
///
/// Built once per compilation event and read-only afterwards. Iteration
/// follows insertion order, which carries no meaning for enhancement.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompiledClassSet {
    classes: IndexMap<ClassName, PathBuf>,
}

impl CompiledClassSet {
    /// Create empty set
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a compiled class, returning the previous location if any
    pub fn insert(&mut self, name: ClassName, file: impl Into<PathBuf>) -> Option<PathBuf> {
        self.classes.insert(name, file.into())
    }

    /// Location of a compiled class by dotted name
    #[must_use]
    pub fn get(&self, dotted_name: &str) -> Option<&Path> {
        self.classes.get(dotted_name).map(PathBuf::as_path)
    }

    /// Check if class was compiled in this round
    #[inline]
    #[must_use]
    pub fn contains(&self, name: &ClassName) -> bool {
        self.classes.contains_key(name)
    }

    /// Iterate over (class, file) pairs
    pub fn iter(&self) -> impl Iterator<Item = (&ClassName, &Path)> {
        self.classes.iter().map(|(name, path)| (name, path.as_path()))
    }

    /// Number of compiled classes
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Check if nothing was compiled
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<(ClassName, PathBuf)> for CompiledClassSet {
    fn from_iter<I: IntoIterator<Item = (ClassName, PathBuf)>>(iter: I) -> Self {
        Self {
            classes: iter.into_iter().collect(),
        }
    }
}

impl Extend<(ClassName, PathBuf)> for CompiledClassSet {
    fn extend<I: IntoIterator<Item = (ClassName, PathBuf)>>(&mut self, iter: I) {
        self.classes.extend(iter);
    }
}
