//! Enhancement batch runner
//!
//! One batch per compilation round:
//!
//! ```text
//! discover packages ─► build resolver + loader ─► create transformer
//!        │
//!        ▼
//! for each compiled class: transform ─► Some(bytes)? ─► overwrite file
//! ```
//!
//! The batch runs inside a single write action. Per-class write problems are
//! reported and skipped; anything else escaping the loop, panics included, is
//! reported once as an ERROR and ends the batch.

use crate::config::EnhanceConfig;
use crate::diagnostics::Reporter;
use crate::error::{EnhanceError, EnhanceResult};
use crate::host::CompileContext;
use crate::manifest::{discover_packages, PackageSet};
use crate::resolver::ClassBytesResolver;
use crate::transform::{DiagnosticLog, ResolverClassLoader, StreamTransform, TransformScope, TransformerFactory};
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::Path;
use tqe_artifact::{ClassBytes, ClassName, CompiledClassSet};

/// Final message of a batch that reached the end of its class list
pub const COMPLETION_MESSAGE: &str = "Ebean query bean enhancement complete!";

/// What a batch did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchReport {
    /// Packages the transformer was scoped to
    pub packages: PackageSet,
    /// Classes rewritten on disk
    pub transformed: Vec<ClassName>,
    /// Classes the transformer declined
    pub unchanged: Vec<ClassName>,
    /// Classes transformed but not written
    pub failed: Vec<ClassName>,
    /// Fatal error text, if the batch stopped early
    pub fatal: Option<String>,
    /// Whether the completion message was emitted
    pub completed: bool,
}

impl BatchReport {
    /// Number of classes the batch looked at
    #[must_use]
    pub fn processed(&self) -> usize {
        self.transformed.len() + self.unchanged.len() + self.failed.len()
    }
}

/// One enhancement pass over the classes of a compilation round
pub struct EnhancementBatch<'a> {
    ctx: &'a dyn CompileContext,
    compiled: &'a CompiledClassSet,
    factory: &'a dyn TransformerFactory,
    config: &'a EnhanceConfig,
}

impl<'a> EnhancementBatch<'a> {
    #[must_use]
    pub fn new(
        ctx: &'a dyn CompileContext,
        compiled: &'a CompiledClassSet,
        factory: &'a dyn TransformerFactory,
        config: &'a EnhanceConfig,
    ) -> Self {
        Self {
            ctx,
            compiled,
            factory,
            config,
        }
    }

    /// Run the batch to completion or to its first fatal error
    pub fn run(&self) -> BatchReport {
        let _span = tracing::info_span!("enhance", classes = self.compiled.len()).entered();
        let mut report = BatchReport::default();

        let outcome = self.ctx.write_context().run_write_action(&mut || {
            panic::catch_unwind(AssertUnwindSafe(|| self.process(&mut report)))
                .unwrap_or_else(|payload| Err(EnhanceError::Panicked(panic_message(payload.as_ref()))))
        });

        if let Err(err) = outcome {
            let text = format!("{}:{err}{}", err.type_name(), err.trace());
            Reporter::new(self.ctx).error(&text);
            report.fatal = Some(text);
        }
        tracing::info!(
            transformed = report.transformed.len(),
            unchanged = report.unchanged.len(),
            failed = report.failed.len(),
            completed = report.completed,
            "batch finished"
        );
        report
    }

    fn process(&self, report: &mut BatchReport) -> EnhanceResult<()> {
        let reporter = Reporter::new(self.ctx);

        let packages = discover_packages(self.ctx, self.ctx.project().modules(), &self.config.manifest);
        reporter.info(&format!("Ebean Query bean enhancement using packages:{packages}"));

        let resolver = ClassBytesResolver::new(self.ctx, self.compiled, self.config.resolver_cache_capacity);
        let loader = ResolverClassLoader::new(&resolver);
        let log = DiagnosticLog::new(self.ctx);
        let scope = TransformScope::new(&loader, &log);
        let transformer = self.factory.create(&self.config.agent, &packages)?;
        let adapter = StreamTransform::new(transformer.as_ref());
        report.packages = packages;

        let progress = self.ctx.progress();
        progress.set_indeterminate(true);
        progress.set_text(&self.config.progress_label);

        for (class_name, file) in self.compiled.iter() {
            progress.set_text2(class_name.as_str());
            match adapter.transform_file(scope, class_name, file)? {
                Some(bytes) => self.write_back(class_name, file, &bytes, report),
                None => report.unchanged.push(class_name.clone()),
            }
        }

        reporter.info(COMPLETION_MESSAGE);
        report.completed = true;
        Ok(())
    }

    /// Overwrite one compiled file; failures only affect this class
    fn write_back(&self, class_name: &ClassName, file: &Path, bytes: &ClassBytes, report: &mut BatchReport) {
        let reporter = Reporter::new(self.ctx);
        let Some(handle) = self.ctx.files().find_file(file) else {
            reporter.error(&format!("Ebean query bean - outputFile not found writing {class_name}"));
            report.failed.push(class_name.clone());
            return;
        };
        match self.ctx.files().set_binary_content(&handle, bytes.data()) {
            Ok(()) => {
                tracing::debug!(class = %class_name, len = bytes.len(), "class rewritten");
                report.transformed.push(class_name.clone());
            }
            Err(err) => {
                reporter.error(&format!(
                    "Ebean query bean - error writing {class_name} to {}: {err}",
                    file.display()
                ));
                report.failed.push(class_name.clone());
            }
        }
    }
}

impl fmt::Debug for EnhancementBatch<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementBatch")
            .field("classes", &self.compiled.len())
            .field("config", self.config)
            .finish_non_exhaustive()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
