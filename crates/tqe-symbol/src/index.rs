//! Source index with radix tree
//!
//! Provides [`SourceIndex`]: lookup of a type declaration by fully-qualified
//! name across the whole project scope (modules and libraries), plus a
//! file-name index for locating resources anywhere in the project.

use dashmap::DashMap;
use parking_lot::RwLock;
use radix_trie::{Trie, TrieCommon};
use std::path::PathBuf;

/// Where an indexed declaration comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SourceKind {
    /// Declared in a source file of the project
    #[default]
    Source,

    /// Compiled class from a library root; never owned by a module
    Library,
}

/// Indexed type declaration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEntry {
    /// Index key: dotted name with nested separators replaced by dots
    pub qualified_name: String,

    /// File holding the declaration
    pub containing_file: PathBuf,

    /// Project source or library origin
    pub kind: SourceKind,
}

/// Whole-scope symbol index
///
/// Keys are stored with a trailing `.` so that a longest-prefix lookup in
/// the radix trie lands on whole name segments: `com.acme.Order.Line.` finds
/// `com.acme.Order.` but `com.acme.OrderLine.` does not.
///
/// The trie sits behind a `parking_lot::RwLock`; the file-name index is a
/// `DashMap` so resource registration never blocks class lookups.
#[derive(Debug, Default)]
pub struct SourceIndex {
    /// `<qualified name>.` -> declaration
    classes: RwLock<Trie<String, SourceEntry>>,

    /// File name -> every file carrying that name
    by_file_name: DashMap<String, Vec<PathBuf>>,
}

impl SourceIndex {
    /// Create empty index
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a declaration
    ///
    /// # Errors
    /// Returns error if the name is already indexed; the first declaration wins
    pub fn insert(
        &self,
        qualified_name: impl Into<String>,
        containing_file: impl Into<PathBuf>,
        kind: SourceKind,
    ) -> Result<(), IndexError> {
        let qualified_name = qualified_name.into();
        let key = trie_key(&qualified_name);
        let mut classes = self.classes.write();
        if let Some(existing) = classes.get(&key) {
            return Err(IndexError::DuplicateClass {
                name: qualified_name,
                existing: existing.containing_file.clone(),
            });
        }
        classes.insert(
            key,
            SourceEntry {
                qualified_name,
                containing_file: containing_file.into(),
                kind,
            },
        );
        Ok(())
    }

    /// Find the declaration of a class by index key
    ///
    /// Nested classes live in their outer class's file, so an unknown key
    /// falls back to its longest indexed ancestor
    /// (`com.acme.Order.Line` → `com.acme.Order`).
    #[must_use]
    pub fn find_class(&self, key: &str) -> Option<SourceEntry> {
        self.classes
            .read()
            .get_ancestor_value(trie_key(key).as_str())
            .cloned()
    }

    /// Register a file under its file name
    pub fn register_file(&self, path: impl Into<PathBuf>) {
        let path = path.into();
        let Some(name) = path.file_name().and_then(|n| n.to_str()).map(str::to_owned) else {
            return;
        };
        let mut files = self.by_file_name.entry(name).or_default();
        if !files.contains(&path) {
            files.push(path);
        }
    }

    /// Every registered file with exactly this file name
    #[must_use]
    pub fn files_by_name(&self, name: &str) -> Vec<PathBuf> {
        self.by_file_name
            .get(name)
            .map(|entry| entry.value().clone())
            .unwrap_or_default()
    }

    /// Number of indexed declarations
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.read().len()
    }

    /// Check if no declarations are indexed
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.read().is_empty()
    }
}

fn trie_key(name: &str) -> String {
    format!("{name}.")
}

/// Errors for index operations
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    /// Class already indexed
    #[error("duplicate class: {name} already declared in {}", existing.display())]
    DuplicateClass {
        /// Qualified name
        name: String,
        /// File of the first declaration
        existing: PathBuf,
    },

    /// Directory walk failed
    #[error("failed to walk {}: {source}", root.display())]
    Walk {
        /// Root being scanned
        root: PathBuf,
        /// Underlying walk error
        #[source]
        source: walkdir::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn index_with(entries: &[(&str, &str)]) -> SourceIndex {
        let index = SourceIndex::new();
        for (name, file) in entries {
            index.insert(*name, *file, SourceKind::Source).unwrap();
        }
        index
    }

    #[test]
    fn index_exact_lookup() {
        let index = index_with(&[("com.acme.Order", "/src/com/acme/Order.java")]);

        let found = index.find_class("com.acme.Order").unwrap();
        assert_eq!(found.containing_file, PathBuf::from("/src/com/acme/Order.java"));
        assert_eq!(found.kind, SourceKind::Source);
    }

    #[test]
    fn index_nested_class_resolves_to_outer_file() {
        let index = index_with(&[("com.acme.Order", "/src/com/acme/Order.java")]);

        let found = index.find_class("com.acme.Order.Line").unwrap();
        assert_eq!(found.qualified_name, "com.acme.Order");
    }

    #[test]
    fn index_unknown_class() {
        let index = index_with(&[("com.acme.Order", "/src/com/acme/Order.java")]);
        assert!(index.find_class("com.acme.Customer").is_none());
        assert!(index.find_class("org.other.Order").is_none());
    }

    #[test]
    fn index_duplicate_keeps_first() {
        let index = index_with(&[("a.B", "/one/B.java")]);
        let err = index.insert("a.B", "/two/B.java", SourceKind::Source).unwrap_err();
        assert!(matches!(err, IndexError::DuplicateClass { .. }));
        assert_eq!(index.find_class("a.B").unwrap().containing_file, PathBuf::from("/one/B.java"));
    }

    #[test]
    fn index_ancestor_lookup_respects_segments() {
        let index = index_with(&[("com.acme.Order", "/a"), ("com.acme.Order.Line", "/b")]);

        assert_eq!(index.find_class("com.acme.Order.Line.Detail").unwrap().containing_file, PathBuf::from("/b"));
        assert_eq!(index.find_class("com.acme.Order.Other").unwrap().containing_file, PathBuf::from("/a"));
        assert!(index.find_class("com.acme.OrderLine").is_none());
        assert!(index.find_class("com.acme").is_none());
    }

    #[test]
    fn file_name_index() {
        let index = SourceIndex::new();
        index.register_file("/p/a/META-INF/ebean-typequery.mf");
        index.register_file("/p/b/ebean-typequery.mf");
        index.register_file("/p/b/ebean-typequery.mf");
        index.register_file("/p/b/other.txt");

        assert_eq!(index.files_by_name("ebean-typequery.mf").len(), 2);
        assert!(index.files_by_name("missing.mf").is_empty());
    }

    #[test]
    fn library_kind_is_kept() {
        let index = SourceIndex::new();
        index.insert("org.lib.Base", "/lib/org/lib/Base.class", SourceKind::Library).unwrap();
        assert_eq!(index.find_class("org.lib.Base").unwrap().kind, SourceKind::Library);
        assert_eq!(index.len(), 1);
    }

    proptest::proptest! {
        #[test]
        fn nested_keys_resolve_to_outer_file(
            nested in proptest::collection::vec("[A-Z][a-z]{0,5}", 0..4),
        ) {
            let index = index_with(&[("com.acme.Order", "/src/com/acme/Order.java")]);
            let mut key = "com.acme.Order".to_string();
            for part in &nested {
                key.push('.');
                key.push_str(part);
            }
            let entry = index.find_class(&key).unwrap();
            proptest::prop_assert_eq!(entry.containing_file, PathBuf::from("/src/com/acme/Order.java"));
        }
    }
}
