//! TQE Artifact Types
//!
//! Value types shared by every stage of compiled-class enhancement.
//!
//! # Core Concepts
//!
//! - [`ClassName`]: fully-qualified binary class name in dotted, slash and
//!   index-key spellings
//! - [`ClassBytes`]: immutable class file contents
//! - [`CompiledClassSet`]: classes produced by one compilation round
//!
//! # Example
//!
//! ```rust
//! use tqe_artifact::{ClassName, CompiledClassSet};
//!
//! let name = ClassName::from_path("com/acme/Order$Line").unwrap();
//! assert_eq!(name.as_str(), "com.acme.Order$Line");
//! assert_eq!(name.to_index_key(), "com.acme.Order.Line");
//!
//! let mut compiled = CompiledClassSet::new();
//! compiled.insert(name, "/out/com/acme/Order$Line.class");
//! assert!(compiled.get("com.acme.Order$Line").is_some());
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

mod bytes;
mod class_name;
mod compiled;

pub mod classfile;

pub use bytes::{ClassBytes, CLASS_MAGIC};
pub use class_name::{ClassName, ClassNameError, CLASS_EXTENSION, NESTED_SEPARATOR};
pub use classfile::{read_header, ClassFileError, ClassHeader};
pub use compiled::CompiledClassSet;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn compiled_set_keys_match_class_loader_names() {
        let mut compiled = CompiledClassSet::new();
        let name = ClassName::from_dotted("com.acme.Order").unwrap();
        compiled.insert(name.clone(), "/out/com/acme/Order.class");

        // A class loader asks with the slash form; normalizing finds the entry
        let requested = ClassName::from_path("com/acme/Order").unwrap();
        assert!(compiled.contains(&requested));
        assert_eq!(compiled.get(requested.as_str()), compiled.get(name.as_str()));
    }

    #[test]
    fn truncated_class_bytes_have_no_header() {
        let bytes = ClassBytes::new(vec![0xCA, 0xFE, 0xBA, 0xBE, 0, 0, 0, 52]);
        assert!(bytes.data().starts_with(&CLASS_MAGIC));
        assert!(read_header(bytes.data()).is_err());
    }
}
