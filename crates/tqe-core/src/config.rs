//! Project configuration
//!
//! Read from `tqe.toml` in the project root; every key is optional:
//!
//! ```toml
//! settings_path = ".tqe/workspace.json"
//! modules = ["app", "model"]
//! library_dirs = ["lib"]
//!
//! [enhance]
//! progress_label = "Ebean query bean enhancement"
//! resolver_cache_capacity = 1024
//!
//! [enhance.manifest]
//! file_name = "ebean-typequery.mf"
//! directory = "META-INF"
//!
//! [enhance.agent]
//! debug = 2
//!
//! [layout]
//! source_roots = ["src/main/java", "src/test/java"]
//! resource_roots = ["src/main/resources", "src/test/resources"]
//! output_dir = "target/classes"
//! test_output_dir = "target/test-classes"
//! ```

use crate::error::ConfigError;
use crate::settings::DEFAULT_SETTINGS_PATH;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tqe_enhance::{EnhanceConfig, Module, Project};
use tqe_symbol::{SourceIndex, SourceScanner};

/// Config file looked up in the project root
pub const CONFIG_FILE_NAME: &str = "tqe.toml";

/// Directory layout shared by every module (Maven conventions by default)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModuleLayout {
    /// Source roots, relative to the module directory
    pub source_roots: Vec<PathBuf>,
    /// Resource roots, relative to the module directory
    pub resource_roots: Vec<PathBuf>,
    /// Main compiled output, relative to the module directory
    pub output_dir: PathBuf,
    /// Test compiled output, relative to the module directory
    pub test_output_dir: PathBuf,
}

impl Default for ModuleLayout {
    fn default() -> Self {
        Self {
            source_roots: vec!["src/main/java".into(), "src/test/java".into()],
            resource_roots: vec!["src/main/resources".into(), "src/test/resources".into()],
            output_dir: "target/classes".into(),
            test_output_dir: "target/test-classes".into(),
        }
    }
}

impl ModuleLayout {
    /// Module rooted at `dir`
    ///
    /// Only the source and resource roots are content roots, so anything
    /// else under `dir` (library directories included) has no owning module.
    #[must_use]
    pub fn module(&self, name: &str, dir: &Path) -> Module {
        self.source_roots.iter().chain(&self.resource_roots).fold(
            Module::new(name)
                .with_output_dir(dir.join(&self.output_dir))
                .with_test_output_dir(dir.join(&self.test_output_dir)),
            |module, root| module.with_content_root(dir.join(root)),
        )
    }

    fn looks_like_module(&self, dir: &Path) -> bool {
        self.source_roots
            .iter()
            .chain(&self.resource_roots)
            .any(|root| dir.join(root).is_dir())
    }
}

/// Complete project configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TqeConfig {
    /// Enhancement pipeline settings
    pub enhance: EnhanceConfig,
    /// Persisted toggle file, relative to the project root
    pub settings_path: PathBuf,
    /// Module directories relative to the project root; empty means detect
    pub modules: Vec<PathBuf>,
    /// Directories of extracted library classes, relative to the project root
    pub library_dirs: Vec<PathBuf>,
    /// Per-module directory layout
    pub layout: ModuleLayout,
}

impl Default for TqeConfig {
    fn default() -> Self {
        Self {
            enhance: EnhanceConfig::default(),
            settings_path: DEFAULT_SETTINGS_PATH.into(),
            modules: Vec::new(),
            library_dirs: Vec::new(),
            layout: ModuleLayout::default(),
        }
    }
}

impl TqeConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load `tqe.toml` from `project_root`, defaults if there is none
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(project_root: &Path) -> Result<Self, ConfigError> {
        let path = project_root.join(CONFIG_FILE_NAME);
        match fs::read_to_string(&path) {
            Ok(text) => {
                tracing::debug!(path = %path.display(), "loading config");
                Self::from_toml_str(&text).map_err(|source| ConfigError::Parse { path, source })
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Read { path, source }),
        }
    }

    /// Parse TOML text
    ///
    /// # Errors
    /// Returns error if the text is not valid config TOML
    pub fn from_toml_str(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// With enhancement settings
    #[inline]
    #[must_use]
    pub fn with_enhance(mut self, enhance: EnhanceConfig) -> Self {
        self.enhance = enhance;
        self
    }

    /// With settings file path
    #[inline]
    #[must_use]
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = path.into();
        self
    }

    /// With an explicit module directory
    #[inline]
    #[must_use]
    pub fn with_module(mut self, dir: impl Into<PathBuf>) -> Self {
        self.modules.push(dir.into());
        self
    }

    /// With a library class directory
    #[inline]
    #[must_use]
    pub fn with_library_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.library_dirs.push(dir.into());
        self
    }

    /// Settings file for a project rooted at `project_root`
    #[must_use]
    pub fn settings_file(&self, project_root: &Path) -> PathBuf {
        project_root.join(&self.settings_path)
    }

    /// Module directories: configured ones, or the root and its immediate
    /// subdirectories that have a source or resource root
    ///
    /// # Errors
    /// Returns error if the project root cannot be listed
    pub fn module_dirs(&self, project_root: &Path) -> Result<Vec<PathBuf>, ConfigError> {
        if !self.modules.is_empty() {
            return Ok(self.modules.iter().map(|m| project_root.join(m)).collect());
        }

        let listing_err = |source| ConfigError::ProjectDir {
            path: project_root.to_path_buf(),
            source,
        };
        let mut children = Vec::new();
        for entry in fs::read_dir(project_root).map_err(listing_err)? {
            let path = entry.map_err(listing_err)?.path();
            if path.is_dir() && self.layout.looks_like_module(&path) {
                children.push(path);
            }
        }
        children.sort();

        let mut dirs = Vec::with_capacity(children.len() + 1);
        if self.layout.looks_like_module(project_root) {
            dirs.push(project_root.to_path_buf());
        }
        dirs.extend(children);
        Ok(dirs)
    }

    /// Build the project model and its index from disk
    ///
    /// # Errors
    /// Returns error if the root cannot be listed or a directory walk fails
    pub fn build_project(&self, project_root: &Path) -> Result<Project, ConfigError> {
        let name = dir_name(project_root).unwrap_or_else(|| "project".to_string());
        let index = SourceIndex::new();
        let scanner = SourceScanner::new(&index);
        let mut modules = Vec::new();

        for dir in self.module_dirs(project_root)? {
            for root in self.layout.source_roots.iter().chain(&self.layout.resource_roots) {
                scanner.scan_source_root(&dir.join(root))?;
            }
            let module_name = if dir == project_root {
                name.clone()
            } else {
                dir_name(&dir).unwrap_or_else(|| name.clone())
            };
            modules.push(self.layout.module(&module_name, &dir));
        }
        for lib in &self.library_dirs {
            scanner.scan_library_root(&project_root.join(lib))?;
        }

        tracing::debug!(
            project = %name,
            modules = modules.len(),
            indexed = index.len(),
            "project model built"
        );
        let mut project = Project::new(name, project_root).with_index(index);
        for module in modules {
            project.add_module(module);
        }
        Ok(project)
    }
}

fn dir_name(path: &Path) -> Option<String> {
    path.file_name().and_then(|n| n.to_str()).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults() {
        let config = TqeConfig::new();
        assert_eq!(config.settings_path, PathBuf::from(".tqe/workspace.json"));
        assert_eq!(config.enhance, EnhanceConfig::default());
        assert_eq!(config.layout.output_dir, PathBuf::from("target/classes"));
        assert!(config.modules.is_empty());
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(TqeConfig::from_toml_str("").unwrap(), TqeConfig::default());
    }

    #[test]
    fn toml_overrides_nested_keys() {
        let config = TqeConfig::from_toml_str(
            r#"
            settings_path = "state.json"
            modules = ["app"]

            [enhance.agent]
            debug = 0

            [enhance.manifest]
            file_name = "query.mf"

            [layout]
            output_dir = "build/classes"
            "#,
        )
        .unwrap();

        assert_eq!(config.settings_path, PathBuf::from("state.json"));
        assert_eq!(config.modules, vec![PathBuf::from("app")]);
        assert_eq!(config.enhance.agent.debug, 0);
        assert_eq!(config.enhance.manifest.file_name, "query.mf");
        assert_eq!(config.enhance.manifest.directory, "META-INF");
        assert_eq!(config.enhance.progress_label, "Ebean query bean enhancement");
        assert_eq!(config.layout.output_dir, PathBuf::from("build/classes"));
        assert_eq!(config.layout.test_output_dir, PathBuf::from("target/test-classes"));
    }

    #[test]
    fn unknown_value_type_is_rejected() {
        assert!(TqeConfig::from_toml_str("modules = 3").is_err());
    }

    #[test]
    fn builders() {
        let config = TqeConfig::new()
            .with_settings_path("s.json")
            .with_module("app")
            .with_library_dir("lib")
            .with_enhance(EnhanceConfig::new().with_debug_level(1));
        assert_eq!(config.settings_file(Path::new("/p")), PathBuf::from("/p/s.json"));
        assert_eq!(config.library_dirs, vec![PathBuf::from("lib")]);
        assert_eq!(config.enhance.agent.debug, 1);
    }

    #[test]
    fn layout_builds_module_outputs() {
        let module = ModuleLayout::default().module("app", Path::new("/p/app"));
        assert_eq!(module.output_dir(), Some(Path::new("/p/app/target/classes")));
        assert_eq!(module.test_output_dir(), Some(Path::new("/p/app/target/test-classes")));
        assert_eq!(
            module.content_roots(),
            &[
                PathBuf::from("/p/app/src/main/java"),
                PathBuf::from("/p/app/src/test/java"),
                PathBuf::from("/p/app/src/main/resources"),
                PathBuf::from("/p/app/src/test/resources"),
            ]
        );
    }

    #[test]
    fn root_module_does_not_own_library_dirs() {
        let root = Path::new("/p");
        let project = Project::new("p", root)
            .with_module(ModuleLayout::default().module("p", root));

        let owner = project.module_for_file(Path::new("/p/src/main/java/com/acme/Order.java"));
        assert_eq!(owner.map(Module::name), Some("p"));
        assert!(project.module_for_file(Path::new("/p/lib/org/lib/BaseModel.class")).is_none());
    }
}
