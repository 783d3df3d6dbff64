//! Enhancement service facade
//!
//! Wires one project's pieces together: configuration, the event bus, the
//! batch listener, the enablement component and the persisted toggle.

use crate::config::TqeConfig;
use crate::enablement::EnablementComponent;
use crate::error::CoreResult;
use crate::events::{CompilationEventBus, CompilationListener};
use crate::listener::{EnhancementListener, SharedFactory};
use crate::settings::{JsonSettingsStore, SettingsStore};
use crate::toggle::ProjectRegistry;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tqe_artifact::CompiledClassSet;
use tqe_enhance::{discover_packages, BatchReport, CompileContext, PackageSet, Project};

/// Enhancement for one open project
pub struct EnhancementService {
    root: PathBuf,
    config: TqeConfig,
    bus: Arc<CompilationEventBus>,
    listener: Arc<EnhancementListener>,
    enablement: Arc<EnablementComponent>,
    settings: Box<dyn SettingsStore>,
}

impl EnhancementService {
    /// Open the project at `root`: load `tqe.toml` and the persisted toggle
    ///
    /// # Errors
    /// Returns error if the config or the settings file cannot be read
    pub fn open(root: impl Into<PathBuf>, factory: SharedFactory) -> CoreResult<Self> {
        let root = root.into();
        let config = TqeConfig::load(&root)?;
        let settings = JsonSettingsStore::new(config.settings_file(&root));
        Self::with_parts(root, config, factory, Box::new(settings))
    }

    /// Open with explicit configuration and settings store
    ///
    /// # Errors
    /// Returns error if the stored toggle state cannot be read
    pub fn with_parts(
        root: impl Into<PathBuf>,
        config: TqeConfig,
        factory: SharedFactory,
        settings: Box<dyn SettingsStore>,
    ) -> CoreResult<Self> {
        let bus = Arc::new(CompilationEventBus::new());
        let listener = Arc::new(EnhancementListener::new(factory, config.enhance.clone()));
        let as_listener: Arc<dyn CompilationListener> = listener.clone();
        let enablement = Arc::new(EnablementComponent::new(Arc::clone(&bus), as_listener));

        if let Some(state) = settings.load_state()? {
            enablement.load_state(state);
        }

        let root = root.into();
        tracing::debug!(
            root = %root.display(),
            enabled = enablement.is_enabled(),
            "enhancement service opened"
        );
        Ok(Self {
            root,
            config,
            bus,
            listener,
            enablement,
            settings,
        })
    }

    #[inline]
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &TqeConfig {
        &self.config
    }

    /// The project's compilation event bus
    #[inline]
    #[must_use]
    pub fn bus(&self) -> &Arc<CompilationEventBus> {
        &self.bus
    }

    #[inline]
    #[must_use]
    pub fn enablement(&self) -> &Arc<EnablementComponent> {
        &self.enablement
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enablement.is_enabled()
    }

    /// Switch enhancement and persist the new state
    ///
    /// # Errors
    /// Returns error if the state cannot be saved
    pub fn set_enabled(&self, enabled: bool) -> CoreResult<()> {
        self.enablement.set_enabled(enabled);
        self.settings.save_state(self.enablement.state())?;
        Ok(())
    }

    /// Make the project reachable from an [`crate::EnhancementToggle`]
    pub fn register(&self, registry: &ProjectRegistry, name: impl Into<String>) {
        registry.register(name, Arc::clone(&self.enablement));
    }

    /// Project model scanned from disk
    ///
    /// # Errors
    /// Returns error if the project directories cannot be indexed
    pub fn build_project(&self) -> CoreResult<Project> {
        Ok(self.config.build_project(&self.root)?)
    }

    /// Packages the next batch would be scoped to
    pub fn packages(&self, ctx: &dyn CompileContext) -> PackageSet {
        discover_packages(ctx, ctx.project().modules(), &self.config.enhance.manifest)
    }

    /// Raise a compilation-finished event
    ///
    /// Returns the batch report when enhancement is enabled, `None` otherwise.
    pub fn compilation_finished(
        &self,
        ctx: &dyn CompileContext,
        compiled: &CompiledClassSet,
    ) -> Option<BatchReport> {
        let enabled = self.is_enabled();
        self.bus.compilation_finished(ctx, compiled);
        if enabled {
            self.listener.last_report()
        } else {
            None
        }
    }

    /// Run a batch whether or not enhancement is enabled
    pub fn enhance(&self, ctx: &dyn CompileContext, compiled: &CompiledClassSet) -> BatchReport {
        self.listener.enhance(ctx, compiled)
    }

    /// Close the project: persist the toggle, then stop listening
    ///
    /// # Errors
    /// Returns error if the state cannot be saved; the listener is removed
    /// either way
    pub fn close(self) -> CoreResult<()> {
        let saved = self.settings.save_state(self.enablement.state());
        self.enablement.project_closed();
        saved?;
        Ok(())
    }
}

impl fmt::Debug for EnhancementService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EnhancementService")
            .field("root", &self.root)
            .field("enabled", &self.is_enabled())
            .field("listeners", &self.bus.listener_count())
            .finish_non_exhaustive()
    }
}
