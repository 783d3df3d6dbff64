//! TQE Symbol Index
//!
//! Whole-scope lookup of type declarations by fully-qualified name, and of
//! project files by file name.
//!
//! # Overview
//!
//! - **SourceIndex**: radix-tree index of declarations plus a file-name index
//! - **SourceScanner**: walks source, resource and library roots into the index
//!
//! # Example
//!
//! ```rust
//! use tqe_symbol::{SourceIndex, SourceKind};
//!
//! let index = SourceIndex::new();
//! index
//!     .insert("com.acme.Order", "/src/com/acme/Order.java", SourceKind::Source)
//!     .unwrap();
//!
//! // Nested classes resolve to the file of their outer class
//! let entry = index.find_class("com.acme.Order.Line").unwrap();
//! assert!(entry.containing_file.ends_with("Order.java"));
//! ```

#![warn(missing_docs)]

pub mod index;
pub mod scan;

// Re-exports
pub use index::{IndexError, SourceEntry, SourceIndex, SourceKind};
pub use scan::{ScanStats, SourceScanner, DEFAULT_SOURCE_EXTENSIONS};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
