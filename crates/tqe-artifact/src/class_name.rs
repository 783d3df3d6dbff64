//! Fully-qualified class names
//!
//! Provides [`ClassName`], which moves between the three spellings the
//! enhancement pipeline needs:
//! - dotted (`com.acme.Order$Line`), the key of a compiled-class set
//! - slash (`com/acme/Order$Line`), the form a class loader asks for
//! - index key (`com.acme.Order.Line`), the form the symbol index stores

use std::borrow::Borrow;
use std::fmt::{self, Display, Formatter};
use std::path::PathBuf;
use std::str::FromStr;

/// Separator between a class and its nested class in binary names
pub const NESTED_SEPARATOR: char = '$';

/// File extension of compiled classes (without dot)
pub const CLASS_EXTENSION: &str = "class";

/// Fully-qualified binary class name, stored in dotted form
///
/// # Examples
/// - `com/acme/Order` → `com.acme.Order`
/// - `com.acme.Order$Line` stays as is, index key `com.acme.Order.Line`
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ClassName(String);

impl ClassName {
    /// Parse a slash-separated name as handed over by a class loader
    ///
    /// # Errors
    /// Returns error if the name is empty or has an invalid segment
    pub fn from_path(path: &str) -> Result<Self, ClassNameError> {
        let path = path.strip_suffix(".class").unwrap_or(path);
        Self::parse_segments(path.split('/'))
    }

    /// Parse a dotted binary name
    ///
    /// # Errors
    /// Returns error if the name is empty or has an invalid segment
    pub fn from_dotted(name: &str) -> Result<Self, ClassNameError> {
        Self::parse_segments(name.split('.'))
    }

    fn parse_segments<'a>(segments: impl Iterator<Item = &'a str>) -> Result<Self, ClassNameError> {
        let mut parts = Vec::new();
        for seg in segments {
            if seg.is_empty() {
                return Err(ClassNameError::EmptySegment);
            }
            if seg.contains(|c: char| !(c.is_alphanumeric() || c == '_' || c == NESTED_SEPARATOR)) {
                return Err(ClassNameError::InvalidSegment(seg.to_string()));
            }
            parts.push(seg);
        }
        if parts.is_empty() {
            return Err(ClassNameError::Empty);
        }
        Ok(Self(parts.join(".")))
    }

    /// Dotted form
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Slash form (`com/acme/Order$Line`)
    #[inline]
    #[must_use]
    pub fn to_path(&self) -> String {
        self.0.replace('.', "/")
    }

    /// Key used by the symbol index: nested separators become dots
    #[inline]
    #[must_use]
    pub fn to_index_key(&self) -> String {
        self.0.replace(NESTED_SEPARATOR, ".")
    }

    /// Relative location of the compiled class below an output directory
    #[must_use]
    pub fn class_file_path(&self) -> PathBuf {
        let mut path: PathBuf = self.0.split('.').collect();
        path.set_extension(CLASS_EXTENSION);
        path
    }

    /// Package part (empty for the default package)
    #[must_use]
    pub fn package(&self) -> &str {
        self.0.rsplit_once('.').map_or("", |(pkg, _)| pkg)
    }

    /// Binary simple name, including any nested suffix
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.0.rsplit_once('.').map_or(self.0.as_str(), |(_, name)| name)
    }

    /// Check if the class sits in `package` or one of its subpackages
    ///
    /// Matching is per segment: `com.acme` covers `com.acme.Order` and
    /// `com.acme.sub.Item` but not `com.acmecorp.Order`.
    #[must_use]
    pub fn is_in_package(&self, package: &str) -> bool {
        let package = package.trim_end_matches('.');
        if package.is_empty() {
            return true;
        }
        self.0
            .strip_prefix(package)
            .is_some_and(|rest| rest.starts_with('.'))
    }
}

impl Display for ClassName {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for ClassName {
    type Err = ClassNameError;

    /// Accepts dotted or slash form
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains('/') {
            Self::from_path(s)
        } else {
            Self::from_dotted(s)
        }
    }
}

// Hash and Eq only see the dotted string, so borrowed lookups agree
impl Borrow<str> for ClassName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ClassName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Errors when parsing class names
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClassNameError {
    /// No segments at all
    #[error("class name is empty")]
    Empty,

    /// Empty segment (e.g., "com..Order" or "com/acme/")
    #[error("empty segment in class name")]
    EmptySegment,

    /// Segment contains characters not allowed in a binary name
    #[error("invalid class name segment: '{0}'")]
    InvalidSegment(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_path_normalizes_to_dotted() {
        let name = ClassName::from_path("com/acme/Order").unwrap();
        assert_eq!(name.as_str(), "com.acme.Order");
        assert_eq!(name.to_path(), "com/acme/Order");
    }

    #[test]
    fn from_path_strips_class_extension() {
        let name = ClassName::from_path("com/acme/Order.class").unwrap();
        assert_eq!(name.as_str(), "com.acme.Order");
    }

    #[test]
    fn nested_index_key() {
        let name = ClassName::from_path("com/acme/Order$Line").unwrap();
        assert_eq!(name.as_str(), "com.acme.Order$Line");
        assert_eq!(name.to_index_key(), "com.acme.Order.Line");
    }

    #[test]
    fn class_file_path_keeps_nested_separator() {
        let name = ClassName::from_dotted("com.acme.Order$Line").unwrap();
        assert_eq!(
            name.class_file_path(),
            PathBuf::from("com").join("acme").join("Order$Line.class")
        );
    }

    #[test]
    fn package_and_simple_name() {
        let name = ClassName::from_dotted("com.acme.Order").unwrap();
        assert_eq!(name.package(), "com.acme");
        assert_eq!(name.simple_name(), "Order");

        let default_pkg = ClassName::from_dotted("Main").unwrap();
        assert_eq!(default_pkg.package(), "");
        assert_eq!(default_pkg.simple_name(), "Main");
    }

    #[test]
    fn package_membership_is_per_segment() {
        let name = ClassName::from_dotted("com.acme.domain.Order").unwrap();
        assert!(name.is_in_package("com.acme"));
        assert!(name.is_in_package("com.acme.domain"));
        assert!(name.is_in_package("com.acme."));
        assert!(!name.is_in_package("com.acm"));
        assert!(!name.is_in_package("com.acme.domain.Order"));
    }

    #[test]
    fn from_str_accepts_both_forms() {
        let a: ClassName = "com/acme/Order".parse().unwrap();
        let b: ClassName = "com.acme.Order".parse().unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_bad_names() {
        assert_eq!(ClassName::from_dotted(""), Err(ClassNameError::EmptySegment));
        assert_eq!(ClassName::from_path("com//Order"), Err(ClassNameError::EmptySegment));
        assert!(matches!(
            ClassName::from_dotted("com.ac-me.Order"),
            Err(ClassNameError::InvalidSegment(_))
        ));
    }

    proptest::proptest! {
        #[test]
        fn slash_and_dotted_spellings_agree(
            segments in proptest::collection::vec("[a-z][a-z0-9_]{0,6}", 1..5),
            nested in proptest::option::of("[A-Z][a-zA-Z0-9]{0,6}"),
        ) {
            let mut dotted = segments.join(".");
            if let Some(inner) = &nested {
                dotted.push(NESTED_SEPARATOR);
                dotted.push_str(inner);
            }
            let name = ClassName::from_dotted(&dotted).unwrap();
            let from_path = ClassName::from_path(&name.to_path()).unwrap();
            proptest::prop_assert_eq!(&from_path, &name);
            proptest::prop_assert!(!name.to_index_key().contains(NESTED_SEPARATOR));
        }
    }
}
