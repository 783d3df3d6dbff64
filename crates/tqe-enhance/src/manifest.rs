//! Manifest discovery
//!
//! Finds the packages holding type query beans. Two sources are merged:
//! - `META-INF/ebean-typequery.mf` in each module's compiled-output directory,
//!   read as manifest format (only the `packages` attribute counts)
//! - every project file named `ebean-typequery.mf` found through the file-name
//!   index, read as a raw package list
//!
//! Most modules have no manifest, so absence is silent and unreadable files
//! are warnings.

use crate::diagnostics::Reporter;
use crate::error::ManifestError;
use crate::host::{CompileContext, Module, ReadOutcome};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use std::path::{Path, PathBuf};
use tqe_artifact::ClassName;

/// Manifest file name
pub const MANIFEST_FILE_NAME: &str = "ebean-typequery.mf";

/// Directory below an output directory holding the manifest
pub const MANIFEST_DIRECTORY: &str = "META-INF";

/// The one attribute read from manifests
pub const PACKAGES_ATTRIBUTE: &str = "packages";

/// Where manifests live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManifestLocation {
    /// File name searched project-wide
    pub file_name: String,
    /// Directory below each output directory
    pub directory: String,
}

impl ManifestLocation {
    /// Path relative to an output directory (`META-INF/ebean-typequery.mf`)
    #[must_use]
    pub fn relative_path(&self) -> PathBuf {
        Path::new(&self.directory).join(&self.file_name)
    }
}

impl Default for ManifestLocation {
    fn default() -> Self {
        Self {
            file_name: MANIFEST_FILE_NAME.to_string(),
            directory: MANIFEST_DIRECTORY.to_string(),
        }
    }
}

/// Package prefixes holding enhancement targets
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PackageSet(BTreeSet<String>);

impl PackageSet {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a delimiter-separated package list
    ///
    /// Entries are split on `,`, `;` and whitespace. A trailing `.*` or `.` is
    /// dropped; attribute labels such as `packages:` are ignored. Returns the
    /// number of newly added packages.
    pub fn add_raw(&mut self, raw: &str) -> usize {
        raw.split(|c: char| c == ',' || c == ';' || c.is_whitespace())
            .filter(|entry| self.insert(entry))
            .count()
    }

    /// Insert one package, returning whether it was new
    pub fn insert(&mut self, package: &str) -> bool {
        let entry = package.trim();
        if entry.ends_with(':') {
            return false;
        }
        let entry = entry.strip_suffix(".*").unwrap_or(entry).trim_end_matches('.');
        if entry.is_empty() {
            return false;
        }
        self.0.insert(entry.to_string())
    }

    /// Merge another set
    pub fn merge(&mut self, other: PackageSet) {
        self.0.extend(other.0);
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, package: &str) -> bool {
        self.0.contains(package)
    }

    /// Check if a class belongs to any package in the set
    #[must_use]
    pub fn matches(&self, class: &ClassName) -> bool {
        self.0.iter().any(|pkg| class.is_in_package(pkg))
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl Display for PackageSet {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.0.iter().cloned().collect::<Vec<_>>().join(", "))
    }
}

impl<S: AsRef<str>> FromIterator<S> for PackageSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut set = Self::new();
        for package in iter {
            set.insert(package.as_ref());
        }
        set
    }
}

/// Main-section attributes of manifest-format text
///
/// `Key: value` lines; a line starting with one space continues the previous
/// value; the first blank line ends the main section. Keys are
/// case-insensitive.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ManifestAttributes {
    entries: IndexMap<String, String>,
}

impl ManifestAttributes {
    /// Parse manifest text
    ///
    /// # Errors
    /// Returns error on a line that is neither an attribute nor a continuation
    pub fn parse(text: &str) -> Result<Self, ManifestError> {
        let mut entries: IndexMap<String, String> = IndexMap::new();
        let mut current: Option<String> = None;

        for (idx, line) in text.lines().enumerate() {
            let line_no = idx + 1;
            if line.is_empty() {
                break;
            }
            if let Some(rest) = line.strip_prefix(' ') {
                let key = current
                    .as_deref()
                    .ok_or(ManifestError::OrphanContinuation { line: line_no })?;
                if let Some(value) = entries.get_mut(key) {
                    value.push_str(rest);
                }
                continue;
            }

            let (key, value) = line
                .split_once(": ")
                .or_else(|| line.strip_suffix(':').map(|key| (key, "")))
                .filter(|(key, _)| !key.trim().is_empty())
                .ok_or_else(|| ManifestError::MalformedLine {
                    line: line_no,
                    content: line.to_string(),
                })?;
            let key = key.trim().to_ascii_lowercase();
            entries.insert(key.clone(), value.to_string());
            current = Some(key);
        }

        Ok(Self { entries })
    }

    /// Attribute value by case-insensitive name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    /// The `packages` attribute
    #[inline]
    #[must_use]
    pub fn packages(&self) -> Option<&str> {
        self.get(PACKAGES_ATTRIBUTE)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Discover the packages to enhance for this compilation round
///
/// Reads the manifest in every module's output directory, then every file
/// with the manifest's name known to the project index, and returns the union.
pub fn discover_packages<C>(ctx: &C, modules: &[Module], location: &ManifestLocation) -> PackageSet
where
    C: CompileContext + ?Sized,
{
    let reporter = Reporter::new(ctx);
    let mut packages = PackageSet::new();
    let mut indexed = PackageSet::new();
    let relative = location.relative_path();

    for module in modules {
        let Some(output_dir) = ctx.module_output_directory(module) else {
            tracing::debug!(module = module.name(), "no output directory");
            continue;
        };
        let path = output_dir.join(&relative);
        let text = match ctx.files().read(&path) {
            ReadOutcome::Bytes(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            ReadOutcome::Absent => {
                tracing::debug!(module = module.name(), "no manifest in output directory");
                continue;
            }
            ReadOutcome::Unreadable(err) => {
                reporter.warn(&format!(
                    "Error reading {} from {} error:{err}",
                    relative.display(),
                    output_dir.display()
                ));
                continue;
            }
        };
        match ManifestAttributes::parse(&text) {
            Ok(attributes) => {
                if let Some(raw) = attributes.packages() {
                    let added = packages.add_raw(raw);
                    tracing::debug!(module = module.name(), added, "read output manifest");
                }
            }
            Err(err) => reporter.warn(&format!(
                "Error reading {} from {} error:{err}",
                relative.display(),
                output_dir.display()
            )),
        }
    }

    for path in ctx.project().index().files_by_name(&location.file_name) {
        match ctx.files().read(&path) {
            ReadOutcome::Bytes(bytes) => {
                let added = indexed.add_raw(&String::from_utf8_lossy(&bytes));
                tracing::debug!(path = %path.display(), added, "read indexed manifest");
            }
            ReadOutcome::Absent => {
                tracing::debug!(path = %path.display(), "indexed manifest vanished");
            }
            ReadOutcome::Unreadable(err) => {
                reporter.warn(&format!("Error reading {} error:{err}", path.display()));
            }
        }
    }

    packages.merge(indexed);
    packages
}
