//! TQE Enhance - compiled-class enhancement pipeline
//!
//! Runs a bytecode [`Transformer`] over the classes a compilation round just
//! produced:
//! - Discovers the packages to enhance from manifests
//! - Resolves class bytes for the transformer, with fallbacks for classes not
//!   compiled in this round
//! - Writes back only what the transformer changed
//! - Reports every failure on the build output instead of raising it
//!
//! The host (IDE, build driver, command line) is reached only through the
//! traits in [`host`].
//!
//! # Example
//!
//! ```rust,ignore
//! use tqe_enhance::{EnhanceConfig, EnhancementBatch, LocalCompileContext, Project};
//!
//! let ctx = LocalCompileContext::new(Project::new("shop", "/work/shop"));
//! let config = EnhanceConfig::new();
//! let report = EnhancementBatch::new(&ctx, &compiled, &factory, &config).run();
//! println!("{} classes rewritten", report.transformed.len());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod batch;
pub mod config;
pub mod diagnostics;
pub mod error;
pub mod host;
pub mod local;
pub mod manifest;
pub mod resolver;
pub mod transform;

// Re-exports for convenience
pub use batch::{BatchReport, EnhancementBatch, COMPLETION_MESSAGE};
pub use config::{AgentOptions, EnhanceConfig, DEFAULT_DEBUG_LEVEL, DEFAULT_PROGRESS_LABEL};
pub use diagnostics::{Message, MessageLog, MessageSink, Reporter, Severity};
pub use error::{EnhanceError, EnhanceResult, ManifestError, ResolveError, TransformError};
pub use host::{
    CompileContext, FileHandle, FileLayer, Module, ProgressIndicator, Project, ReadOutcome,
    WriteContext,
};
pub use local::{LocalCompileContext, LocalFileSystem, LockedWriteContext, TracingProgress};
pub use manifest::{
    discover_packages, ManifestAttributes, ManifestLocation, PackageSet, MANIFEST_DIRECTORY,
    MANIFEST_FILE_NAME,
};
pub use resolver::{
    ClassBytesResolver, CompiledSetStrategy, Resolution, ResolveStrategy, SourceIndexStrategy,
};
pub use transform::{
    ClassBytesLoader, DiagnosticLog, ResolverClassLoader, StreamTransform, TransformLog,
    TransformScope, Transformer, TransformerFactory,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for hosts and transformer implementations
    pub use crate::{
        CompileContext, EnhanceConfig, EnhancementBatch, PackageSet, TransformScope, Transformer,
        TransformerFactory,
    };
    pub use tqe_artifact::{ClassName, CompiledClassSet};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
