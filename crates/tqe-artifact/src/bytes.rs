//! Class bytes
//!
//! Immutable contents of one class file. Transformation never edits bytes in
//! place; it produces a new [`ClassBytes`] or leaves the input alone.

use std::sync::Arc;

/// Magic header of every class file
pub const CLASS_MAGIC: [u8; 4] = [0xCA, 0xFE, 0xBA, 0xBE];

/// Immutable class file contents
///
/// Cheap to clone (shared buffer), so resolved bytes can be cached and handed
/// to several consumers.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ClassBytes(Arc<[u8]>);

impl ClassBytes {
    /// Create from byte vector
    #[inline]
    #[must_use]
    pub fn new(data: Vec<u8>) -> Self {
        Self(Arc::from(data))
    }

    /// Get reference to bytes
    #[inline]
    #[must_use]
    pub fn data(&self) -> &[u8] {
        &self.0
    }

    /// Copy out into an owned vector
    #[inline]
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        self.0.to_vec()
    }

    /// Content length
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Default for ClassBytes {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl From<Vec<u8>> for ClassBytes {
    fn from(data: Vec<u8>) -> Self {
        Self::new(data)
    }
}

impl From<&[u8]> for ClassBytes {
    fn from(data: &[u8]) -> Self {
        Self(Arc::from(data))
    }
}

impl AsRef<[u8]> for ClassBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}
