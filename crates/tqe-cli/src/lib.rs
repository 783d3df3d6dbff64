//! Library side of the `tqe` command line
//!
//! - [`CommandTransformerFactory`]: transformer backed by an external process
//! - [`compiled_set_from_files`]: compiled-class set from class files on disk

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod command;
pub mod input;

pub use command::{CommandTransformer, CommandTransformerFactory, AGENT_ENV, PACKAGES_ENV};
pub use input::{compiled_set_from_files, InputError};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
