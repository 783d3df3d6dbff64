//! Directory scanner feeding the [`SourceIndex`]

use crate::index::{IndexError, SourceIndex, SourceKind};
use std::path::Path;
use tqe_artifact::{ClassName, CLASS_EXTENSION};
use walkdir::WalkDir;

/// Source file extensions indexed by default
pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["java", "kt", "groovy", "scala"];

/// Counters for one scanned root
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanStats {
    /// Files registered in the file-name index
    pub files: usize,
    /// Declarations added to the class index
    pub classes: usize,
    /// Declarations skipped because the name was already indexed
    pub duplicates: usize,
}

/// Walks project roots and populates a [`SourceIndex`]
#[derive(Debug)]
pub struct SourceScanner<'a> {
    index: &'a SourceIndex,
    source_extensions: Vec<String>,
}

impl<'a> SourceScanner<'a> {
    /// Create scanner with default source extensions
    #[must_use]
    pub fn new(index: &'a SourceIndex) -> Self {
        Self {
            index,
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| (*s).to_string()).collect(),
        }
    }

    /// Index a module source/resource root
    ///
    /// Every file lands in the file-name index; source files also declare the
    /// class their path names (`com/acme/Order.java` → `com.acme.Order`).
    ///
    /// # Errors
    /// Returns error if the directory walk fails
    pub fn scan_source_root(&self, root: &Path) -> Result<ScanStats, IndexError> {
        self.scan(root, SourceKind::Source, |path| {
            path.extension()
                .and_then(|e| e.to_str())
                .is_some_and(|ext| self.source_extensions.iter().any(|s| s == ext))
        })
    }

    /// Index a library root holding extracted class files
    ///
    /// # Errors
    /// Returns error if the directory walk fails
    pub fn scan_library_root(&self, root: &Path) -> Result<ScanStats, IndexError> {
        self.scan(root, SourceKind::Library, |path| {
            path.extension().and_then(|e| e.to_str()) == Some(CLASS_EXTENSION)
        })
    }

    fn scan(
        &self,
        root: &Path,
        kind: SourceKind,
        declares_class: impl Fn(&Path) -> bool,
    ) -> Result<ScanStats, IndexError> {
        let mut stats = ScanStats::default();
        if !root.is_dir() {
            tracing::debug!(root = %root.display(), "skipping missing root");
            return Ok(stats);
        }

        for entry in WalkDir::new(root).follow_links(true) {
            let entry = entry.map_err(|source| IndexError::Walk {
                root: root.to_path_buf(),
                source,
            })?;
            if !entry.file_type().is_file() {
                continue;
            }
            let path = entry.path();
            self.index.register_file(path);
            stats.files += 1;

            if !declares_class(path) {
                continue;
            }
            let Some(key) = index_key(root, path) else {
                continue;
            };
            match self.index.insert(key, path, kind) {
                Ok(()) => stats.classes += 1,
                Err(err) => {
                    tracing::debug!(error = %err, "first declaration wins");
                    stats.duplicates += 1;
                }
            }
        }

        tracing::debug!(
            root = %root.display(),
            files = stats.files,
            classes = stats.classes,
            "indexed root"
        );
        Ok(stats)
    }
}

/// Index key of the class a file under `root` declares
fn index_key(root: &Path, path: &Path) -> Option<String> {
    let relative = path.strip_prefix(root).ok()?.with_extension("");
    let segments: Vec<&str> = relative
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<_>>()?;
    let simple = segments.last()?;
    if *simple == "module-info" || *simple == "package-info" {
        return None;
    }
    ClassName::from_path(&segments.join("/"))
        .map(|name| name.to_index_key())
        .ok()
}
