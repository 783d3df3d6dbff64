//! Byte transform adapter
//!
//! The enhancement algorithm is an opaque [`Transformer`]. This module feeds it
//! whole class files and gives it two services for the length of a batch,
//! bundled in a [`TransformScope`]:
//! - a [`ClassBytesLoader`] for auxiliary classes (supertypes and the like),
//!   answered by the batch's resolver through [`ResolverClassLoader`]
//! - a [`TransformLog`] whose lines land on the build output

use crate::config::AgentOptions;
use crate::diagnostics::{MessageSink, Severity};
use crate::error::{EnhanceResult, TransformError};
use crate::manifest::PackageSet;
use crate::resolver::ClassBytesResolver;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tqe_artifact::{ClassBytes, ClassName};

/// Chunk size used when draining a class file
pub const READ_CHUNK_SIZE: usize = 1028;

/// Initial capacity of the buffer a class file is read into
pub const OUTPUT_CAPACITY: usize = 4096;

/// Source of class bytes for classes the transformer needs to inspect
pub trait ClassBytesLoader {
    /// Bytes of `class_path` (`com/acme/Order`), `None` if unavailable
    fn load_class_bytes(&self, class_path: &str) -> Option<ClassBytes>;
}

/// Class loader backed by the batch's resolver
pub struct ResolverClassLoader<'r, 'a> {
    resolver: &'r ClassBytesResolver<'a>,
}

impl<'r, 'a> ResolverClassLoader<'r, 'a> {
    #[inline]
    #[must_use]
    pub fn new(resolver: &'r ClassBytesResolver<'a>) -> Self {
        Self { resolver }
    }
}

impl ClassBytesLoader for ResolverClassLoader<'_, '_> {
    fn load_class_bytes(&self, class_path: &str) -> Option<ClassBytes> {
        tracing::trace!(class = class_path, "auxiliary class requested");
        self.resolver.resolve(class_path)
    }
}

impl fmt::Debug for ResolverClassLoader<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverClassLoader")
            .field("resolver", self.resolver)
            .finish()
    }
}

/// Log output of a transformer
pub trait TransformLog {
    /// Record one chunk of output; may span several lines
    fn log(&self, text: &str);
}

/// Sends transformer log output to the build output, one INFORMATION per line
pub struct DiagnosticLog<'a, S: ?Sized> {
    sink: &'a S,
}

impl<'a, S: MessageSink + ?Sized> DiagnosticLog<'a, S> {
    #[inline]
    #[must_use]
    pub fn new(sink: &'a S) -> Self {
        Self { sink }
    }
}

impl<S: MessageSink + ?Sized> TransformLog for DiagnosticLog<'_, S> {
    fn log(&self, text: &str) {
        for line in text.lines().filter(|line| !line.trim().is_empty()) {
            tracing::debug!(target: "tqe::agent", "{line}");
            self.sink.add_message(Severity::Information, line);
        }
    }
}

/// Batch services lent to a transformer for one call
#[derive(Clone, Copy)]
pub struct TransformScope<'s> {
    loader: &'s dyn ClassBytesLoader,
    log: &'s dyn TransformLog,
}

impl<'s> TransformScope<'s> {
    #[inline]
    #[must_use]
    pub fn new(loader: &'s dyn ClassBytesLoader, log: &'s dyn TransformLog) -> Self {
        Self { loader, log }
    }

    /// Load an auxiliary class through the batch's resolver
    #[inline]
    #[must_use]
    pub fn load_class_bytes(&self, class_path: &str) -> Option<ClassBytes> {
        self.loader.load_class_bytes(class_path)
    }

    /// Write transformer log output
    #[inline]
    pub fn log(&self, text: &str) {
        self.log.log(text);
    }
}

impl fmt::Debug for TransformScope<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransformScope").finish_non_exhaustive()
    }
}

/// Bytecode enhancement capability
///
/// Implementations decide per class whether to enhance, typically by package
/// membership in the [`PackageSet`] they were created with.
pub trait Transformer {
    /// Transform one class
    ///
    /// Returns `Ok(None)` when the class is left alone.
    ///
    /// # Errors
    /// Returns error if the class cannot be transformed
    fn transform(
        &self,
        scope: TransformScope<'_>,
        class_name: &ClassName,
        bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, TransformError>;
}

/// Builds the transformer for one batch
pub trait TransformerFactory {
    /// Create a transformer scoped to `packages`
    ///
    /// # Errors
    /// Returns error if the transformer cannot be set up; the batch stops
    fn create(&self, options: &AgentOptions, packages: &PackageSet) -> EnhanceResult<Box<dyn Transformer>>;
}

/// Feeds files and streams to a [`Transformer`]
pub struct StreamTransform<'t> {
    transformer: &'t dyn Transformer,
}

impl<'t> StreamTransform<'t> {
    #[inline]
    #[must_use]
    pub fn new(transformer: &'t dyn Transformer) -> Self {
        Self { transformer }
    }

    /// Transform a compiled class file
    ///
    /// # Errors
    /// Returns error if the file cannot be opened or read, or the transformer fails
    pub fn transform_file(
        &self,
        scope: TransformScope<'_>,
        class_name: &ClassName,
        path: &Path,
    ) -> Result<Option<ClassBytes>, TransformError> {
        let file = File::open(path).map_err(|source| TransformError::open(path, source))?;
        self.transform_stream(scope, class_name, file)
    }

    /// Transform class bytes read from `reader`
    ///
    /// The reader is consumed and dropped before the transformer runs.
    ///
    /// # Errors
    /// Returns error if reading fails or the transformer fails
    pub fn transform_stream<R: Read>(
        &self,
        scope: TransformScope<'_>,
        class_name: &ClassName,
        reader: R,
    ) -> Result<Option<ClassBytes>, TransformError> {
        let bytes = read_bytes(reader).map_err(|source| TransformError::Read {
            class: class_name.to_string(),
            source,
        })?;
        let transformed = self.transformer.transform(scope, class_name, &bytes)?;
        Ok(transformed.map(|out| {
            if out.as_slice() == bytes.as_slice() {
                tracing::debug!(class = %class_name, "transformer returned unchanged bytes");
            }
            ClassBytes::new(out)
        }))
    }
}

impl fmt::Debug for StreamTransform<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamTransform").finish_non_exhaustive()
    }
}

/// Drain a reader into memory
///
/// # Errors
/// Returns the first non-interrupt read error
pub fn read_bytes<R: Read>(reader: R) -> io::Result<Vec<u8>> {
    let mut input = BufReader::new(reader);
    let mut out = Vec::with_capacity(OUTPUT_CAPACITY);
    let mut chunk = [0u8; READ_CHUNK_SIZE];
    loop {
        match input.read(&mut chunk) {
            Ok(0) => break,
            Ok(n) => out.extend_from_slice(&chunk[..n]),
            Err(err) if err.kind() == io::ErrorKind::Interrupted => {}
            Err(err) => return Err(err),
        }
    }
    Ok(out)
}
