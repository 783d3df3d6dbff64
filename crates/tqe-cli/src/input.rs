//! Compiled-class set from class files named on the command line

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tqe_artifact::{read_header, ClassFileError, CompiledClassSet};

/// Errors turning class files into a compiled-class set
#[derive(Debug, thiserror::Error)]
pub enum InputError {
    /// File could not be read
    #[error("cannot read class file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// File is not a parseable class file
    #[error("{} is not a class file: {source}", path.display())]
    Header {
        path: PathBuf,
        #[source]
        source: ClassFileError,
    },
}

/// Map each file to the class its header names
///
/// Paths are made absolute; a class named twice keeps the last file.
///
/// # Errors
/// Returns error on the first file that cannot be read or parsed
pub fn compiled_set_from_files<P: AsRef<Path>>(
    files: impl IntoIterator<Item = P>,
) -> Result<CompiledClassSet, InputError> {
    let mut compiled = CompiledClassSet::new();
    for file in files {
        let file = file.as_ref();
        let read_err = |source| InputError::Read {
            path: file.to_path_buf(),
            source,
        };
        let bytes = fs::read(file).map_err(read_err)?;
        let header = read_header(&bytes).map_err(|source| InputError::Header {
            path: file.to_path_buf(),
            source,
        })?;
        let absolute = fs::canonicalize(file).map_err(read_err)?;
        tracing::debug!(class = %header.name, file = %absolute.display(), "compiled class");
        if let Some(previous) = compiled.insert(header.name, absolute) {
            tracing::warn!(file = %previous.display(), "class named twice, keeping the later file");
        }
    }
    Ok(compiled)
}
