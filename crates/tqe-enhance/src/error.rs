//! Error types for the enhancement pipeline
//!
//! Provides error handling for:
//! - Manifest parsing
//! - Class resolution (reported, never raised)
//! - Transformation (file → transformer → bytes)
//! - Whole-batch failures caught at the batch boundary

use std::path::PathBuf;

/// Errors parsing manifest-format text
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ManifestError {
    /// Line is neither `Key: value` nor a continuation
    #[error("malformed manifest line {line}: '{content}'")]
    MalformedLine { line: usize, content: String },

    /// Continuation line with no attribute before it
    #[error("continuation without attribute at line {line}")]
    OrphanContinuation { line: usize },
}

/// Reasons a class lookup ends without bytes
///
/// Displayed text is the WARNING written to the build output.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolveError {
    /// File known to hold the class could not be read
    #[error("Error reading file contents: {}", path.display())]
    Unreadable { path: PathBuf },

    /// No declaration for the class in the whole-scope index
    #[error("Couldn't find source declaration for class: {key}")]
    NotIndexed { key: String },
}

/// Errors while transforming one class
#[derive(Debug, thiserror::Error)]
pub enum TransformError {
    /// Compiled file could not be opened
    #[error("cannot open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Reading class bytes failed midway
    #[error("io error reading class {class}: {source}")]
    Read {
        class: String,
        #[source]
        source: std::io::Error,
    },

    /// Transformer rejected the class file format
    #[error("illegal class format for {class}: {reason}")]
    IllegalClassFormat { class: String, reason: String },

    /// Transformer-specific failure
    #[error("transformer failed on {class}: {message}")]
    Agent { class: String, message: String },
}

impl TransformError {
    /// Create open error for path
    pub fn open(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Open {
            path: path.into(),
            source,
        }
    }

    /// Create agent error for class
    pub fn agent(class: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Agent {
            class: class.into(),
            message: message.into(),
        }
    }
}

/// Fatal errors for one enhancement batch
///
/// Anything of this type escaping the per-class loop ends the batch and is
/// reported once as an ERROR message.
#[derive(Debug, thiserror::Error)]
pub enum EnhanceError {
    #[error("transform error: {0}")]
    Transform(#[from] TransformError),

    #[error("transformer setup failed: {0}")]
    TransformerSetup(String),

    #[error("panic during enhancement: {0}")]
    Panicked(String),
}

impl EnhanceError {
    /// Qualified name of the variant, used as the error "type" in reports
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Transform(TransformError::Open { .. }) => "TransformError::Open",
            Self::Transform(TransformError::Read { .. }) => "TransformError::Read",
            Self::Transform(TransformError::IllegalClassFormat { .. }) => {
                "TransformError::IllegalClassFormat"
            }
            Self::Transform(TransformError::Agent { .. }) => "TransformError::Agent",
            Self::TransformerSetup(_) => "EnhanceError::TransformerSetup",
            Self::Panicked(_) => "EnhanceError::Panicked",
        }
    }

    /// Source chain rendered as trace text, innermost cause last
    #[must_use]
    pub fn trace(&self) -> String {
        let mut frames = Vec::new();
        let mut current = std::error::Error::source(self);
        while let Some(cause) = current {
            frames.push(cause.to_string());
            current = cause.source();
        }
        format!("[{}]", frames.join(", "))
    }
}

/// Result type alias for batch operations
pub type EnhanceResult<T> = Result<T, EnhanceError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn manifest_error_display() {
        let err = ManifestError::MalformedLine {
            line: 3,
            content: "garbage".to_string(),
        };
        assert_eq!(err.to_string(), "malformed manifest line 3: 'garbage'");
    }

    #[test]
    fn resolve_error_messages() {
        let err = ResolveError::NotIndexed {
            key: "com.acme.Order.Line".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Couldn't find source declaration for class: com.acme.Order.Line"
        );
        let err = ResolveError::Unreadable {
            path: PathBuf::from("/out/A.class"),
        };
        assert_eq!(err.to_string(), "Error reading file contents: /out/A.class");
    }

    #[test]
    fn transform_error_converts() {
        let err: EnhanceError =
            TransformError::open("/out/A.class", io::Error::from(io::ErrorKind::NotFound)).into();
        assert_eq!(err.type_name(), "TransformError::Open");
        assert!(err.to_string().contains("/out/A.class"));
    }

    #[test]
    fn trace_lists_causes() {
        let err: EnhanceError =
            TransformError::open("/out/A.class", io::Error::new(io::ErrorKind::Other, "disk gone"))
                .into();
        let trace = err.trace();
        assert!(trace.starts_with('['));
        assert!(trace.contains("disk gone"));
    }

    #[test]
    fn panicked_has_empty_trace() {
        let err = EnhanceError::Panicked("boom".to_string());
        assert_eq!(err.trace(), "[]");
        assert_eq!(err.type_name(), "EnhanceError::Panicked");
    }
}
