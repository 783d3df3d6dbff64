//! TQE Core - project-level enhancement control
//!
//! Sits between a host and the `tqe-enhance` pipeline:
//! - [`CompilationEventBus`]: explicit subscribe/unsubscribe of listeners for
//!   compilation-finished events
//! - [`EnablementComponent`]: the per-project on/off state that owns the
//!   pipeline listener's subscription
//! - [`SettingsStore`]: persistence of that state across sessions
//! - [`TqeConfig`]: `tqe.toml` configuration and the on-disk project model
//! - [`EnhancementService`]: all of the above for one project
//!
//! # Example
//!
//! ```rust,ignore
//! use tqe_core::EnhancementService;
//!
//! let service = EnhancementService::open("/work/shop", factory)?;
//! service.set_enabled(true)?;
//! let ctx = LocalCompileContext::new(service.build_project()?);
//! if let Some(report) = service.compilation_finished(&ctx, &compiled) {
//!     println!("{} classes rewritten", report.transformed.len());
//! }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod enablement;
pub mod error;
pub mod events;
pub mod listener;
pub mod service;
pub mod settings;
pub mod toggle;

// Re-exports for convenience
pub use config::{ModuleLayout, TqeConfig, CONFIG_FILE_NAME};
pub use enablement::{EnablementComponent, EnhancementState};
pub use error::{ConfigError, CoreError, CoreResult, SettingsError};
pub use events::{CompilationEventBus, CompilationListener, Subscription};
pub use listener::{EnhancementListener, SharedFactory};
pub use service::EnhancementService;
pub use settings::{
    JsonSettingsStore, SettingsStore, DEFAULT_SETTINGS_PATH, ENHANCEMENT_STATE_KEY,
};
pub use toggle::{EnhancementToggle, ProjectRegistry};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts
    pub use crate::{
        CompilationEventBus, CompilationListener, EnhancementService, EnhancementState,
        EnhancementToggle, TqeConfig,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
