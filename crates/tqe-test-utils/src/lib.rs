//! Testing utilities for TQE workspace
//!
//! Shared fixtures: class file bytes, temporary Maven-style projects, scripted
//! transformers and file layers that fail on demand.

#![allow(missing_docs)]

use parking_lot::Mutex;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tempfile::TempDir;
use tqe_artifact::{read_header, ClassName, CompiledClassSet, CLASS_MAGIC};
use tqe_enhance::{
    AgentOptions, EnhanceError, EnhanceResult, FileHandle, FileLayer, LocalFileSystem, Module,
    PackageSet, Project, ReadOutcome, TransformError, TransformScope, Transformer,
    TransformerFactory,
};
use tqe_symbol::{SourceIndex, SourceScanner};

/// Source and resource roots of every fixture module
pub const MODULE_ROOTS: [&str; 4] = [
    "src/main/java",
    "src/test/java",
    "src/main/resources",
    "src/test/resources",
];

/// Bytes appended by [`ScriptedTransformer`] to mark a class as enhanced
pub const ENHANCED_MARKER: &[u8] = b"<tqe-enhanced>";

fn utf8_constant(out: &mut Vec<u8>, value: &str) {
    out.push(1);
    out.extend_from_slice(&u16::try_from(value.len()).unwrap().to_be_bytes());
    out.extend_from_slice(value.as_bytes());
}

/// Minimal class file declaring `name` (slash form) extending `super_name`
pub fn class_file_with_super(name: &str, super_name: &str) -> Vec<u8> {
    let mut out = CLASS_MAGIC.to_vec();
    out.extend_from_slice(&0u16.to_be_bytes());
    out.extend_from_slice(&61u16.to_be_bytes());
    // #1 utf8 name, #2 class, #3 utf8 super, #4 class
    out.extend_from_slice(&5u16.to_be_bytes());
    utf8_constant(&mut out, name);
    out.push(7);
    out.extend_from_slice(&1u16.to_be_bytes());
    utf8_constant(&mut out, super_name);
    out.push(7);
    out.extend_from_slice(&3u16.to_be_bytes());
    out.extend_from_slice(&0x0021u16.to_be_bytes());
    out.extend_from_slice(&2u16.to_be_bytes());
    out.extend_from_slice(&4u16.to_be_bytes());
    out.extend_from_slice(&[0; 8]);
    out
}

/// Minimal class file declaring `name` (slash form)
pub fn class_file_bytes(name: &str) -> Vec<u8> {
    class_file_with_super(name, "java/lang/Object")
}

pub fn class_name(dotted: &str) -> ClassName {
    ClassName::from_dotted(dotted).unwrap()
}

pub fn is_enhanced(bytes: &[u8]) -> bool {
    bytes.ends_with(ENHANCED_MARKER)
}

/// Temporary multi-module project in Maven layout
///
/// ```text
/// <root>/<module>/src/main/java          sources
/// <root>/<module>/src/main/resources     resources
/// <root>/<module>/target/classes         main output
/// <root>/<module>/target/test-classes    test output
/// <root>/lib                             extracted library classes
/// ```
pub struct TempProject {
    dir: TempDir,
    modules: Vec<String>,
}

impl TempProject {
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            modules: Vec::new(),
        }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn with_module(mut self, name: &str) -> Self {
        self.add_module(name);
        self
    }

    pub fn add_module(&mut self, name: &str) {
        fs::create_dir_all(self.output_dir(name)).unwrap();
        fs::create_dir_all(self.test_output_dir(name)).unwrap();
        fs::create_dir_all(self.root().join(name).join("src/main/java")).unwrap();
        self.modules.push(name.to_string());
    }

    pub fn output_dir(&self, module: &str) -> PathBuf {
        self.root().join(module).join("target/classes")
    }

    pub fn test_output_dir(&self, module: &str) -> PathBuf {
        self.root().join(module).join("target/test-classes")
    }

    pub fn library_dir(&self) -> PathBuf {
        self.root().join("lib")
    }

    /// Write a file relative to the project root
    pub fn write(&self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, contents).unwrap();
        path
    }

    /// Write `<module>/src/main/java/<path>.java` declaring `dotted`
    pub fn write_source(&self, module: &str, dotted: &str) -> PathBuf {
        let name = class_name(dotted);
        let relative = Path::new(module)
            .join("src/main/java")
            .join(name.to_path())
            .with_extension("java");
        self.write(relative, format!("package {};\nclass {} {{}}\n", name.package(), name.simple_name()))
    }

    /// Write the compiled class into the module's main output
    pub fn write_class(&self, module: &str, dotted: &str) -> PathBuf {
        let name = class_name(dotted);
        let path = self.output_dir(module).join(name.class_file_path());
        self.write(path.strip_prefix(self.root()).unwrap(), class_file_bytes(&name.to_path()))
    }

    /// Write the compiled class into the module's test output
    pub fn write_test_class(&self, module: &str, dotted: &str) -> PathBuf {
        let name = class_name(dotted);
        let path = self.test_output_dir(module).join(name.class_file_path());
        self.write(path.strip_prefix(self.root()).unwrap(), class_file_bytes(&name.to_path()))
    }

    /// Write an extracted library class under `lib/`
    pub fn write_library_class(&self, dotted: &str) -> PathBuf {
        let name = class_name(dotted);
        let path = self.library_dir().join(name.class_file_path());
        self.write(path.strip_prefix(self.root()).unwrap(), class_file_bytes(&name.to_path()))
    }

    /// Write `META-INF/ebean-typequery.mf` into the module's main output
    pub fn write_output_manifest(&self, module: &str, packages: &[&str]) -> PathBuf {
        let path = self.output_dir(module).join("META-INF/ebean-typequery.mf");
        self.write(
            path.strip_prefix(self.root()).unwrap(),
            format!("Manifest-Version: 1.0\npackages: {}\n\n", packages.join(", ")),
        )
    }

    /// Write a raw package list as `src/main/resources/ebean-typequery.mf`
    pub fn write_resource_manifest(&self, module: &str, packages: &[&str]) -> PathBuf {
        self.write(
            Path::new(module).join("src/main/resources/ebean-typequery.mf"),
            packages.join("\n"),
        )
    }

    /// Module model owning the module's source and resource roots
    pub fn module(&self, name: &str) -> Module {
        let base = self.root().join(name);
        MODULE_ROOTS
            .iter()
            .fold(Module::new(name), |module, root| module.with_content_root(base.join(root)))
            .with_output_dir(self.output_dir(name))
            .with_test_output_dir(self.test_output_dir(name))
    }

    /// Project model with an index scanned from the files written so far
    pub fn project(&self) -> Project {
        let index = SourceIndex::new();
        let scanner = SourceScanner::new(&index);
        for module in &self.modules {
            let base = self.root().join(module);
            for root in MODULE_ROOTS {
                scanner.scan_source_root(&base.join(root)).unwrap();
            }
        }
        scanner.scan_library_root(&self.library_dir()).unwrap();

        let mut project = Project::new("fixture", self.root()).with_index(index);
        for module in &self.modules {
            project.add_module(self.module(module));
        }
        project
    }
}

impl Default for TempProject {
    fn default() -> Self {
        Self::new()
    }
}

/// Compiled-class set from `(dotted name, file)` pairs
pub fn compiled_set<'p>(entries: impl IntoIterator<Item = (&'p str, PathBuf)>) -> CompiledClassSet {
    entries
        .into_iter()
        .map(|(name, path)| (class_name(name), path))
        .collect()
}

/// What a [`ScriptedTransformer`] saw
#[derive(Debug, Default)]
pub struct TransformRecord {
    /// Classes handed to `transform`, in order
    pub calls: Vec<String>,
    /// Auxiliary lookups: class path and whether bytes came back
    pub loads: Vec<(String, bool)>,
    /// Packages of the last created transformer
    pub packages: Option<PackageSet>,
    /// Agent argument string of the last created transformer
    pub agent_args: Option<String>,
}

/// Idempotent test transformer
///
/// Appends [`ENHANCED_MARKER`] to classes inside its packages unless already
/// present. Optionally loads each class's supertype through the scope, and
/// fails or panics on chosen classes.
#[derive(Clone, Default)]
pub struct ScriptedFactory {
    record: Arc<Mutex<TransformRecord>>,
    load_supertypes: bool,
    fail_on: HashSet<String>,
    panic_on: HashSet<String>,
    refuse_setup: bool,
}

impl ScriptedFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn loading_supertypes(mut self) -> Self {
        self.load_supertypes = true;
        self
    }

    pub fn failing_on(mut self, dotted: &str) -> Self {
        self.fail_on.insert(dotted.to_string());
        self
    }

    pub fn panicking_on(mut self, dotted: &str) -> Self {
        self.panic_on.insert(dotted.to_string());
        self
    }

    pub fn refusing_setup(mut self) -> Self {
        self.refuse_setup = true;
        self
    }

    pub fn record(&self) -> parking_lot::MutexGuard<'_, TransformRecord> {
        self.record.lock()
    }
}

impl TransformerFactory for ScriptedFactory {
    fn create(&self, options: &AgentOptions, packages: &PackageSet) -> EnhanceResult<Box<dyn Transformer>> {
        if self.refuse_setup {
            return Err(EnhanceError::TransformerSetup("agent jar missing".to_string()));
        }
        {
            let mut record = self.record.lock();
            record.packages = Some(packages.clone());
            record.agent_args = Some(options.to_agent_args());
        }
        Ok(Box::new(ScriptedTransformer {
            packages: packages.clone(),
            factory: self.clone(),
        }))
    }
}

pub struct ScriptedTransformer {
    packages: PackageSet,
    factory: ScriptedFactory,
}

impl Transformer for ScriptedTransformer {
    fn transform(
        &self,
        scope: TransformScope<'_>,
        class_name: &ClassName,
        bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, TransformError> {
        self.factory.record.lock().calls.push(class_name.to_string());

        if self.factory.panic_on.contains(class_name.as_str()) {
            panic!("scripted panic on {class_name}");
        }
        if self.factory.fail_on.contains(class_name.as_str()) {
            return Err(TransformError::agent(class_name.as_str(), "scripted failure"));
        }
        if self.factory.load_supertypes {
            if let Some(super_name) = read_header(bytes).ok().and_then(|h| h.super_name) {
                let path = super_name.to_path();
                let found = scope.load_class_bytes(&path).is_some();
                self.factory.record.lock().loads.push((path, found));
            }
        }
        if !self.packages.matches(class_name) || is_enhanced(bytes) {
            return Ok(None);
        }

        scope.log(&format!("enhancing {class_name}\nquery bean fields added"));
        let mut out = bytes.to_vec();
        out.extend_from_slice(ENHANCED_MARKER);
        Ok(Some(out))
    }
}

/// Local file layer that misbehaves for chosen paths
#[derive(Debug, Default)]
pub struct FaultyFileLayer {
    inner: LocalFileSystem,
    missing_handles: HashSet<PathBuf>,
    unreadable: HashSet<PathBuf>,
    failing_writes: HashSet<PathBuf>,
    writes: Arc<Mutex<Vec<PathBuf>>>,
}

impl FaultyFileLayer {
    pub fn new() -> Self {
        Self::default()
    }

    /// `find_file` returns `None` for this path
    pub fn without_handle(mut self, path: impl Into<PathBuf>) -> Self {
        self.missing_handles.insert(path.into());
        self
    }

    /// `read` reports this path as unreadable
    pub fn unreadable(mut self, path: impl Into<PathBuf>) -> Self {
        self.unreadable.insert(path.into());
        self
    }

    /// `set_binary_content` fails for this path
    pub fn failing_write(mut self, path: impl Into<PathBuf>) -> Self {
        self.failing_writes.insert(path.into());
        self
    }

    /// Shared log of successful writes
    pub fn writes(&self) -> Arc<Mutex<Vec<PathBuf>>> {
        Arc::clone(&self.writes)
    }
}

impl FileLayer for FaultyFileLayer {
    fn find_file(&self, path: &Path) -> Option<FileHandle> {
        if self.missing_handles.contains(path) {
            return None;
        }
        self.inner.find_file(path)
    }

    fn read(&self, path: &Path) -> ReadOutcome {
        if self.unreadable.contains(path) {
            return ReadOutcome::Unreadable(io::Error::new(io::ErrorKind::PermissionDenied, "access denied"));
        }
        self.inner.read(path)
    }

    fn set_binary_content(&self, file: &FileHandle, bytes: &[u8]) -> io::Result<()> {
        if self.failing_writes.contains(file.path()) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full"));
        }
        self.inner.set_binary_content(file, bytes)?;
        self.writes.lock().push(file.path().to_path_buf());
        Ok(())
    }
}
