//! Class bytes resolution
//!
//! Resolves the bytecode of a class, by slash-style name, as of the
//! compilation round that just finished. Lookup walks an ordered list of
//! [`ResolveStrategy`] values and stops at the first [`Resolution::Found`]:
//!
//! 1. [`CompiledSetStrategy`]: the class was compiled in this round
//! 2. [`SourceIndexStrategy`]: locate the declaration through the project's
//!    symbol index, then the compiled file in its module's output directories
//!
//! A strategy error is reported as a WARNING and ends the lookup with `None`.
//! Resolution never raises and never stops the batch.

use crate::diagnostics::Reporter;
use crate::error::ResolveError;
use crate::host::{CompileContext, Module, ReadOutcome};
use moka::sync::Cache;
use std::path::{Path, PathBuf};
use tqe_artifact::{ClassBytes, ClassName, CompiledClassSet, CLASS_EXTENSION, NESTED_SEPARATOR};
use tqe_symbol::SourceKind;

/// Outcome of one strategy
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// Bytes found; later strategies are not consulted
    Found(ClassBytes),
    /// This strategy has nothing to say about the class
    NotApplicable,
    /// Lookup failed; later strategies are not consulted
    Error(ResolveError),
}

/// One step of class bytes resolution
pub trait ResolveStrategy {
    /// Short name for traces
    fn name(&self) -> &'static str;

    /// Try to resolve `class_path` (`com/acme/Order$Line`)
    fn resolve(&self, ctx: &dyn CompileContext, class_path: &str) -> Resolution;

    /// Whether a hit may be memoized for the rest of the batch
    fn cacheable(&self) -> bool {
        true
    }
}

/// Lookup in the classes compiled by this round
///
/// A read failure is an error, not a miss; later strategies are not tried.
#[derive(Debug, Clone, Copy)]
pub struct CompiledSetStrategy<'a> {
    compiled: &'a CompiledClassSet,
}

impl<'a> CompiledSetStrategy<'a> {
    /// Strategy over this round's compiled classes
    #[inline]
    #[must_use]
    pub fn new(compiled: &'a CompiledClassSet) -> Self {
        Self { compiled }
    }
}

impl ResolveStrategy for CompiledSetStrategy<'_> {
    fn name(&self) -> &'static str {
        "compiled-set"
    }

    fn resolve(&self, ctx: &dyn CompileContext, class_path: &str) -> Resolution {
        let dotted = class_path.replace('/', ".");
        let Some(file) = self.compiled.get(&dotted) else {
            return Resolution::NotApplicable;
        };
        match ctx.files().read(file) {
            ReadOutcome::Bytes(bytes) => Resolution::Found(ClassBytes::new(bytes)),
            ReadOutcome::Absent | ReadOutcome::Unreadable(_) => {
                Resolution::Error(ResolveError::Unreadable {
                    path: file.to_path_buf(),
                })
            }
        }
    }

    fn cacheable(&self) -> bool {
        false
    }
}

/// Lookup through the whole-scope symbol index
///
/// The declaration's containing file decides where to look next:
/// - library entry, or no owning module: the containing file itself
/// - otherwise `<main output>/<classPath>.class`, then the test output
/// - neither present: the containing file, with a warning
#[derive(Debug, Clone, Copy, Default)]
pub struct SourceIndexStrategy;

impl SourceIndexStrategy {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    fn read(ctx: &dyn CompileContext, path: &Path) -> Resolution {
        match ctx.files().read(path) {
            ReadOutcome::Bytes(bytes) => Resolution::Found(ClassBytes::new(bytes)),
            ReadOutcome::Absent | ReadOutcome::Unreadable(_) => {
                Resolution::Error(ResolveError::Unreadable {
                    path: path.to_path_buf(),
                })
            }
        }
    }

    /// Probe one output directory; `None` when the class file is not there
    fn probe(
        ctx: &dyn CompileContext,
        module: &Module,
        label: &str,
        output_dir: Option<&Path>,
        relative: &Path,
    ) -> Option<Resolution> {
        let Some(dir) = output_dir else {
            Reporter::new(ctx).warn(&format!(
                "{}: Couldn't find {label} output directory!",
                module.name()
            ));
            return None;
        };
        let candidate = dir.join(relative);
        match ctx.files().read(&candidate) {
            ReadOutcome::Bytes(bytes) => Some(Resolution::Found(ClassBytes::new(bytes))),
            ReadOutcome::Absent => None,
            ReadOutcome::Unreadable(err) => {
                tracing::debug!(path = %candidate.display(), error = %err, "unreadable class file");
                Some(Resolution::Error(ResolveError::Unreadable { path: candidate }))
            }
        }
    }
}

impl ResolveStrategy for SourceIndexStrategy {
    fn name(&self) -> &'static str {
        "source-index"
    }

    fn resolve(&self, ctx: &dyn CompileContext, class_path: &str) -> Resolution {
        let key = class_path.replace(['/', NESTED_SEPARATOR], ".");
        let Some(entry) = ctx.project().index().find_class(&key) else {
            return Resolution::Error(ResolveError::NotIndexed { key });
        };
        let containing = entry.containing_file;

        let owner = match entry.kind {
            SourceKind::Library => None,
            SourceKind::Source => ctx.module_for_file(&containing),
        };
        let Some(module) = owner else {
            tracing::debug!(class = class_path, file = %containing.display(), "library origin");
            return Self::read(ctx, &containing);
        };

        let relative = class_file_relative_path(class_path);
        let outputs = [
            ("main", ctx.module_output_directory(module)),
            ("test", ctx.module_test_output_directory(module)),
        ];
        for (label, dir) in outputs {
            if let Some(resolution) = Self::probe(ctx, module, label, dir, &relative) {
                return resolution;
            }
        }

        Reporter::new(ctx).warn(&format!(
            "{}: Couldn't find compiled file for class: {class_path}",
            module.name()
        ));
        Self::read(ctx, &containing)
    }
}

/// `com/acme/Order$Line` → `com/acme/Order$Line.class`
fn class_file_relative_path(class_path: &str) -> PathBuf {
    ClassName::from_path(class_path).map_or_else(
        |_| PathBuf::from(format!("{class_path}.{CLASS_EXTENSION}")),
        |name| name.class_file_path(),
    )
}

/// Resolves class bytes for one batch
///
/// Fallback hits are memoized in a bounded cache for the rest of the batch.
pub struct ClassBytesResolver<'a> {
    ctx: &'a dyn CompileContext,
    strategies: Vec<Box<dyn ResolveStrategy + 'a>>,
    cache: Cache<String, ClassBytes>,
}

impl<'a> ClassBytesResolver<'a> {
    /// Resolver with the standard strategy order
    #[must_use]
    pub fn new(ctx: &'a dyn CompileContext, compiled: &'a CompiledClassSet, cache_capacity: u64) -> Self {
        Self::with_strategies(
            ctx,
            vec![
                Box::new(CompiledSetStrategy::new(compiled)),
                Box::new(SourceIndexStrategy::new()),
            ],
            cache_capacity,
        )
    }

    /// Resolver with a custom strategy order
    #[must_use]
    pub fn with_strategies(
        ctx: &'a dyn CompileContext,
        strategies: Vec<Box<dyn ResolveStrategy + 'a>>,
        cache_capacity: u64,
    ) -> Self {
        Self {
            ctx,
            strategies,
            cache: Cache::new(cache_capacity),
        }
    }

    /// Bytes of `class_path`, or `None` (already reported) if unavailable
    #[must_use]
    pub fn resolve(&self, class_path: &str) -> Option<ClassBytes> {
        if let Some(hit) = self.cache.get(class_path) {
            tracing::trace!(class = class_path, "resolver cache hit");
            return Some(hit);
        }

        for strategy in &self.strategies {
            match strategy.resolve(self.ctx, class_path) {
                Resolution::Found(bytes) => {
                    tracing::debug!(class = class_path, tier = strategy.name(), len = bytes.len(), "resolved");
                    if strategy.cacheable() {
                        self.cache.insert(class_path.to_string(), bytes.clone());
                    }
                    return Some(bytes);
                }
                Resolution::NotApplicable => {}
                Resolution::Error(err) => {
                    Reporter::new(self.ctx).warn(&err.to_string());
                    return None;
                }
            }
        }

        tracing::debug!(class = class_path, "no strategy applies");
        None
    }

    /// Names of the strategies, in order
    pub fn strategy_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.strategies.iter().map(|s| s.name())
    }
}

impl std::fmt::Debug for ClassBytesResolver<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClassBytesResolver")
            .field("strategies", &self.strategy_names().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
