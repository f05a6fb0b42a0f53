//! Persistence seam for documents.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use tempfile::Builder;
use thiserror::Error;
use tracing::debug;

use super::{Document, ModelError};

const STORE_TARGET: &str = "deckwright::store";

/// Errors raised while loading or saving a document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Reading the document failed.
    #[error("failed to read {path}: {source}")]
    Read {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Writing the document failed; the previous contents are intact.
    #[error("failed to write {path}: {source}")]
    Write {
        /// Document path.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// The file is not a document.
    #[error("{path} is not a valid document: {source}")]
    Parse {
        /// Document path.
        path: PathBuf,
        /// Decoder error.
        #[source]
        source: serde_json::Error,
    },
    /// The file decodes but breaks a model invariant.
    #[error("{path} is not a valid document: {source}")]
    Invalid {
        /// Document path.
        path: PathBuf,
        /// Broken invariant.
        #[source]
        source: ModelError,
    },
    /// A document already exists where one was to be created.
    #[error("document {path} already exists")]
    AlreadyExists {
        /// Document path.
        path: PathBuf,
    },
}

/// Loads and saves documents.
///
/// Implementations must make [`DocumentStore::save`] all-or-nothing: after a
/// failed save the previous contents must still be readable.
#[cfg_attr(test, mockall::automock)]
pub trait DocumentStore {
    /// Loads the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] when the file cannot be read or decoded.
    fn load(&self, path: &Path) -> Result<Document, StoreError>;

    /// Replaces the document at `path`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Write`] when persisting fails.
    fn save(&self, path: &Path, document: &Document) -> Result<(), StoreError>;
}

/// Stores documents as pretty-printed JSON.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonDocumentStore;

impl DocumentStore for JsonDocumentStore {
    fn load(&self, path: &Path) -> Result<Document, StoreError> {
        let bytes = fs::read(path).map_err(|source| StoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document: Document =
            serde_json::from_slice(&bytes).map_err(|source| StoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        document.validate().map_err(|source| StoreError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;
        debug!(
            target: STORE_TARGET,
            path = %path.display(),
            slides = document.slide_count(),
            "loaded document"
        );
        Ok(document)
    }

    fn save(&self, path: &Path, document: &Document) -> Result<(), StoreError> {
        let write_error = |source| StoreError::Write {
            path: path.to_path_buf(),
            source,
        };
        let mut payload = serde_json::to_vec_pretty(document)
            .map_err(|error| write_error(io::Error::other(error)))?;
        payload.push(b'\n');
        atomic_write(path, &payload).map_err(write_error)?;
        debug!(
            target: STORE_TARGET,
            path = %path.display(),
            bytes = payload.len(),
            "saved document"
        );
        Ok(())
    }
}

/// Writes `contents` to a sibling temporary file and renames it into place,
/// so readers see either the old document or the new one.
fn atomic_write(path: &Path, contents: &[u8]) -> io::Result<()> {
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        Some(_) => Path::new("."),
        None => {
            return Err(io::Error::new(
                io::ErrorKind::NotFound,
                "document path has no parent directory",
            ));
        }
    };

    let mut builder = Builder::new();
    builder.prefix(".deckwright-");
    builder.suffix(".tmp");
    let mut file = builder.tempfile_in(directory)?;
    file.write_all(contents)?;
    file.as_file().sync_all()?;
    file.persist(path).map_err(|error| error.error)?;
    Ok(())
}
