//! Compilation listener that runs an enhancement batch

use crate::events::CompilationListener;
use parking_lot::Mutex;
use std::fmt;
use std::sync::Arc;
use tqe_artifact::CompiledClassSet;
use tqe_enhance::{BatchReport, CompileContext, EnhanceConfig, EnhancementBatch, TransformerFactory};

/// Shared transformer factory, as held by listeners and services
pub type SharedFactory = Arc<dyn TransformerFactory + Send + Sync>;

/// Runs one [`EnhancementBatch`] per compilation round
pub struct EnhancementListener {
    factory: SharedFactory,
    config: EnhanceConfig,
    last_report: Mutex<Option<BatchReport>>,
}

impl EnhancementListener {
    #[must_use]
    pub fn new(factory: SharedFactory, config: EnhanceConfig) -> Self {
        Self {
            factory,
            config,
            last_report: Mutex::new(None),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &EnhanceConfig {
        &self.config
    }

    /// Run a batch now and return its report
    pub fn enhance(&self, ctx: &dyn CompileContext, compiled: &CompiledClassSet) -> BatchReport {
        let report = EnhancementBatch::new(ctx, compiled, self.factory.as_ref(), &self.config).run();
        *self.last_report.lock() = Some(report.clone());
        report
    }

    /// Report of the most recent batch, if any ran
    #[must_use]
    pub fn last_report(&self) -> Option<BatchReport> {
        self.last_report.lock().clone()
    }
}

impl CompilationListener for EnhancementListener {
    fn compilation_finished(&self, ctx: &dyn CompileContext, compiled: &CompiledClassSet) {
        let report = self.enhance(ctx, compiled);
        tracing::debug!(
            transformed = report.transformed.len(),
            failed = report.failed.len(),
            completed = report.completed,
            "enhancement batch finished"
        );
    }
}

impl fmt::Debug for EnhancementListener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementListener")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
