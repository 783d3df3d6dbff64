//! Host boundary
//!
//! The enhancement pipeline runs inside a host (an IDE or a build driver).
//! Everything it needs from that host is expressed here:
//!
//! ```text
//! CompileContext ─┬─ Project (modules, source index)
//!                 ├─ FileLayer (read / locate / overwrite files)
//!                 ├─ ProgressIndicator
//!                 ├─ WriteContext (write-capable execution context)
//!                 └─ MessageSink (build output)
//! ```

use crate::diagnostics::MessageSink;
use crate::error::EnhanceResult;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tqe_symbol::SourceIndex;

/// A project module and its compiled-output locations
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Module {
    name: String,
    output_dir: Option<PathBuf>,
    test_output_dir: Option<PathBuf>,
    content_roots: Vec<PathBuf>,
}

impl Module {
    /// Create module with no roots or outputs
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            output_dir: None,
            test_output_dir: None,
            content_roots: Vec::new(),
        }
    }

    /// With main compiled-output directory
    #[must_use]
    pub fn with_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    /// With test compiled-output directory
    #[must_use]
    pub fn with_test_output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.test_output_dir = Some(dir.into());
        self
    }

    /// With a content root (sources or resources owned by this module)
    #[must_use]
    pub fn with_content_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.content_roots.push(root.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn output_dir(&self) -> Option<&Path> {
        self.output_dir.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn test_output_dir(&self) -> Option<&Path> {
        self.test_output_dir.as_deref()
    }

    #[inline]
    #[must_use]
    pub fn content_roots(&self) -> &[PathBuf] {
        &self.content_roots
    }

    /// Longest content root containing `path`, if any
    fn owning_root_len(&self, path: &Path) -> Option<usize> {
        self.content_roots
            .iter()
            .filter(|root| path.starts_with(root))
            .map(|root| root.components().count())
            .max()
    }
}

/// Project model: modules plus the whole-scope index
#[derive(Debug)]
pub struct Project {
    name: String,
    base_dir: PathBuf,
    modules: Vec<Module>,
    index: SourceIndex,
}

impl Project {
    /// Create project with an empty index
    #[must_use]
    pub fn new(name: impl Into<String>, base_dir: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            base_dir: base_dir.into(),
            modules: Vec::new(),
            index: SourceIndex::new(),
        }
    }

    /// With module
    #[must_use]
    pub fn with_module(mut self, module: Module) -> Self {
        self.modules.push(module);
        self
    }

    /// With a pre-populated index
    #[must_use]
    pub fn with_index(mut self, index: SourceIndex) -> Self {
        self.index = index;
        self
    }

    /// Add a module after construction
    pub fn add_module(&mut self, module: Module) {
        self.modules.push(module);
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    #[inline]
    #[must_use]
    pub fn modules(&self) -> &[Module] {
        &self.modules
    }

    /// Whole-scope source and file-name index
    #[inline]
    #[must_use]
    pub fn index(&self) -> &SourceIndex {
        &self.index
    }

    /// Module owning a file; nested roots resolve to the innermost module
    #[must_use]
    pub fn module_for_file(&self, path: &Path) -> Option<&Module> {
        self.modules
            .iter()
            .filter_map(|m| m.owning_root_len(path).map(|len| (len, m)))
            .max_by_key(|(len, _)| *len)
            .map(|(_, m)| m)
    }

    /// Module by name
    #[must_use]
    pub fn module(&self, name: &str) -> Option<&Module> {
        self.modules.iter().find(|m| m.name == name)
    }
}

/// Writable handle to an existing file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileHandle {
    path: PathBuf,
}

impl FileHandle {
    #[inline]
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[inline]
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Result of reading a file, keeping "absent" apart from "unreadable"
#[derive(Debug)]
pub enum ReadOutcome {
    /// Whole file contents
    Bytes(Vec<u8>),
    /// Nothing at that location
    Absent,
    /// Something is there but could not be read
    Unreadable(io::Error),
}

impl ReadOutcome {
    /// Classify an `io::Result` from a read
    #[must_use]
    pub fn from_io(result: io::Result<Vec<u8>>) -> Self {
        match result {
            Ok(bytes) => Self::Bytes(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Self::Absent,
            Err(err) => Self::Unreadable(err),
        }
    }
}

/// Host file layer (virtual file system)
pub trait FileLayer {
    /// Writable handle for an existing file; `None` if the host cannot resolve it
    fn find_file(&self, path: &Path) -> Option<FileHandle>;

    /// Read a whole file
    fn read(&self, path: &Path) -> ReadOutcome;

    /// Overwrite a file's contents
    ///
    /// # Errors
    /// Returns error if the write fails
    fn set_binary_content(&self, file: &FileHandle, bytes: &[u8]) -> io::Result<()>;
}

/// Progress surface of the running compilation
pub trait ProgressIndicator {
    /// Switch between a spinner and a fraction bar
    fn set_indeterminate(&self, indeterminate: bool);
    /// Main progress line
    fn set_text(&self, text: &str);
    /// Secondary progress line, usually the item being processed
    fn set_text2(&self, text: &str);
}

impl<P: ProgressIndicator + ?Sized> ProgressIndicator for Arc<P> {
    fn set_indeterminate(&self, indeterminate: bool) {
        (**self).set_indeterminate(indeterminate);
    }

    fn set_text(&self, text: &str) {
        (**self).set_text(text);
    }

    fn set_text2(&self, text: &str) {
        (**self).set_text2(text);
    }
}

/// Write-capable execution context of the host
///
/// File contents may only change while the action runs; the context is
/// acquired before and released after, whatever the action returns.
pub trait WriteContext {
    /// Run `action` inside the write context
    ///
    /// # Errors
    /// Returns the action's error, or an error acquiring the context
    fn run_write_action(&self, action: &mut dyn FnMut() -> EnhanceResult<()>) -> EnhanceResult<()>;
}

/// Everything one compilation round exposes to the pipeline
pub trait CompileContext: MessageSink {
    /// Project being compiled
    fn project(&self) -> &Project;

    /// File layer for reads and class rewrites
    fn files(&self) -> &dyn FileLayer;

    /// Progress surface of this round
    fn progress(&self) -> &dyn ProgressIndicator;

    /// Context every class rewrite runs in
    fn write_context(&self) -> &dyn WriteContext;

    /// Module owning a file, `None` for library files
    fn module_for_file(&self, path: &Path) -> Option<&Module> {
        self.project().module_for_file(path)
    }

    fn module_output_directory<'m>(&self, module: &'m Module) -> Option<&'m Path> {
        module.output_dir()
    }

    fn module_test_output_directory<'m>(&self, module: &'m Module) -> Option<&'m Path> {
        module.test_output_dir()
    }
}
